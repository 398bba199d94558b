//! Marketplace operation errors

use super::FieldValidationError;
use super::StoreError;

/// Result alias for marketplace operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by marketplace operations.
///
/// Each variant maps onto one HTTP status through [`Error::status_code`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input rejected; one entry per failing field.
    #[error("Validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldValidationError>),

    /// Missing, unknown or expired session, or bad credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The referenced entity does not exist (or is not visible).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation clashes with the current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Data layer failure after retries.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn format_fields(fields: &[FieldValidationError]) -> String {
    fields.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl Error {
    /// Single-field validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldValidationError::new(field, message)])
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::Store(_) => 500,
        }
    }

    /// Validation details, empty for other variants.
    pub fn fields(&self) -> &[FieldValidationError] {
        match self {
            Self::Validation(fields) => fields,
            _ => &[],
        }
    }
}

impl From<async_sqlite::Error> for Error {
    fn from(e: async_sqlite::Error) -> Self {
        Self::Store(StoreError::from(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::invalid("title", "too short").status_code(), 400);
        assert_eq!(Error::unauthorized("no session").status_code(), 401);
        assert_eq!(Error::forbidden("sellers only").status_code(), 403);
        assert_eq!(Error::not_found("Article", "x").status_code(), 404);
        assert_eq!(Error::conflict("already sold").status_code(), 409);
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = Error::Validation(vec![
            FieldValidationError::new("title", "too short"),
            FieldValidationError::new("price", "must be positive"),
        ]);
        assert_eq!(err.to_string(), "Validation failed: title: too short, price: must be positive");
        assert_eq!(err.fields().len(), 2);
    }
}
