//! Request parsing and response building shared by the routes.

use boudoir_lib::client::api::ErrorBody;
use boudoir_lib::error::Error;
use boudoir_lib::error::FieldValidationError;
use http_body_util::BodyExt;
use http_body_util::Full;
use http_body_util::LengthLimitError;
use http_body_util::Limited;
use hyper::HeaderMap;
use hyper::Response;
use hyper::StatusCode;
use hyper::Uri;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::header;
use hyper::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

pub type HttpResponse = Response<Full<Bytes>>;

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Errors a request can end in.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Marketplace(#[from] Error),

    #[error("{0}")]
    BadRequest(String),

    #[error("No route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Request body exceeds {MAX_BODY_BYTES} bytes")]
    PayloadTooLarge,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Marketplace(e) => StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// The JSON body sent to the client. Internal failures are logged and
    /// reported without detail.
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::Marketplace(Error::Store(e)) => {
                log::error!("Store failure while serving request: {}", e);
                ErrorBody {
                    error: "Internal server error".to_string(),
                    fields: Vec::new(),
                }
            }
            Self::Marketplace(e) => ErrorBody {
                error: e.to_string(),
                fields: e.fields().to_vec(),
            },
            other => ErrorBody {
                error: other.to_string(),
                fields: Vec::new(),
            },
        }
    }
}

impl From<Vec<FieldValidationError>> for ApiError {
    fn from(fields: Vec<FieldValidationError>) -> Self {
        Self::Marketplace(Error::Validation(fields))
    }
}

// =============================================================================
// Responses
// =============================================================================

fn with_body(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub fn json<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => with_body(status, "application/json", body),
        Err(e) => {
            log::error!("Failed to serialize response: {}", e);
            with_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                br#"{"error":"Internal server error","fields":[]}"#.to_vec(),
            )
        }
    }
}

pub fn ok<T: Serialize>(value: &T) -> HttpResponse {
    json(StatusCode::OK, value)
}

pub fn created<T: Serialize>(value: &T) -> HttpResponse {
    json(StatusCode::CREATED, value)
}

pub fn no_content() -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

pub fn error(err: &ApiError) -> HttpResponse {
    json(err.status(), &err.body())
}

/// Attaches the session cookie, or clears it when `token` is `None`.
pub fn set_session_cookie(response: &mut HttpResponse, token: Option<&str>, max_age_secs: i64) {
    let cookie = match token {
        Some(token) => format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, token, max_age_secs
        ),
        None => format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE),
    };
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        Err(e) => log::warn!("Invalid session cookie value: {}", e),
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Reads and decodes a JSON body of at most [`MAX_BODY_BYTES`].
pub async fn read_json<T: DeserializeOwned>(body: Incoming) -> Result<T, ApiError> {
    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => return Err(ApiError::PayloadTooLarge),
        Err(e) => return Err(ApiError::BadRequest(format!("Failed to read request body: {}", e))),
    };
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Decoded query string pairs.
pub fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Value of the last `key` parameter.
pub fn query_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

/// Parses a numeric query parameter, reporting malformed values.
pub fn query_u32(pairs: &[(String, String)], key: &str, default: u32) -> Result<u32, ApiError> {
    match query_value(pairs, key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::invalid(key, format!("invalid value '{}'", raw)).into()),
        None => Ok(default),
    }
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Parses an id path segment.
pub fn path_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| Error::invalid("id", format!("'{}' is not a valid id", raw)).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=from-cookie"));
        assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_missing_token() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert!(session_token(&headers).is_none());
    }

    #[test]
    fn test_query_parsing() {
        let uri: Uri = "/api/feed?page=2&pageSize=&search=robe%20rouge".parse().unwrap();
        let pairs = query_pairs(&uri);
        assert_eq!(query_value(&pairs, "search"), Some("robe rouge"));
        assert_eq!(query_u32(&pairs, "page", 1).unwrap(), 2);
        assert_eq!(query_u32(&pairs, "pageSize", 12).unwrap(), 12);

        let uri: Uri = "/api/feed?page=two".parse().unwrap();
        let err = query_u32(&query_pairs(&uri), "page", 1).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.body().fields[0].field, "page");
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(ApiError::from(Error::conflict("sold")).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let err = ApiError::RouteNotFound {
            method: "GET".into(),
            path: "/nope".into(),
        };
        assert_eq!(error(&err).status(), StatusCode::NOT_FOUND);
    }
}
