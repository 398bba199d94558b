//! Input validation
//!
//! Validators collect every failing field instead of stopping at the first
//! one, so forms can highlight all problems at once.

use rust_decimal::Decimal;

use crate::error::Error;
use crate::error::FieldValidationError;
use crate::model::ArticleInput;

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 2000;
pub const PRICE_MAX: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);
pub const MAX_IMAGES: usize = 8;
pub const PASSWORD_MIN: usize = 8;
pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;

#[derive(Debug, Default)]
struct Errors(Vec<FieldValidationError>);

impl Errors {
    fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.0.push(FieldValidationError::new(field, message));
        }
    }

    fn finish(self) -> Result<(), Error> {
        if self.0.is_empty() { Ok(()) } else { Err(Error::Validation(self.0)) }
    }
}

fn char_len(s: &str) -> usize {
    s.trim().chars().count()
}

fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}

/// Field rules of an article. Category existence is checked by the caller.
pub fn validate_article(input: &ArticleInput) -> Result<(), Error> {
    let mut errors = Errors::default();

    let title = char_len(&input.title);
    errors.check(
        (TITLE_MIN..=TITLE_MAX).contains(&title),
        "title",
        format!("must be between {} and {} characters", TITLE_MIN, TITLE_MAX),
    );

    let description = char_len(&input.description);
    errors.check(
        (DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&description),
        "description",
        format!("must be between {} and {} characters", DESCRIPTION_MIN, DESCRIPTION_MAX),
    );

    errors.check(input.price > Decimal::ZERO, "price", "must be greater than 0");
    errors.check(input.price <= PRICE_MAX, "price", format!("must not exceed {}", PRICE_MAX));

    errors.check(
        input.images.len() <= MAX_IMAGES,
        "images",
        format!("at most {} images", MAX_IMAGES),
    );
    for (i, image) in input.images.iter().enumerate() {
        errors.check(is_http_url(image), &format!("images[{}]", i), "must be an http(s) URL");
    }

    errors.finish()
}

/// Rules for a new account.
pub fn validate_registration(email: &str, name: &str, password: &str) -> Result<(), Error> {
    let mut errors = Errors::default();

    let email = email.trim();
    let valid_email = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'))
        .unwrap_or(false);
    errors.check(valid_email && !email.contains(char::is_whitespace), "email", "must be a valid email address");

    let name = char_len(name);
    errors.check(
        (NAME_MIN..=NAME_MAX).contains(&name),
        "name",
        format!("must be between {} and {} characters", NAME_MIN, NAME_MAX),
    );

    errors.check(
        password.chars().count() >= PASSWORD_MIN,
        "password",
        format!("must be at least {} characters", PASSWORD_MIN),
    );

    errors.finish()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::model::Condition;

    fn input() -> ArticleInput {
        ArticleInput {
            title: "Veste en jean".to_string(),
            description: "Veste en jean Levi's, très bon état".to_string(),
            price: Decimal::new(4500, 2),
            brand: Some("Levi's".to_string()),
            size: Some("M".to_string()),
            condition: Condition::VeryGood,
            category_id: Uuid::new_v4(),
            images: vec!["https://img.example/1.jpg".to_string()],
        }
    }

    fn fields(result: Result<(), Error>) -> Vec<String> {
        match result {
            Err(Error::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_article() {
        assert!(validate_article(&input()).is_ok());
    }

    #[test]
    fn test_collects_every_failing_field() {
        let mut bad = input();
        bad.title = "ab".to_string();
        bad.description = "short".to_string();
        bad.price = Decimal::ZERO;
        assert_eq!(fields(validate_article(&bad)), vec!["title", "description", "price"]);
    }

    #[test]
    fn test_price_bounds() {
        let mut article = input();
        article.price = PRICE_MAX;
        assert!(validate_article(&article).is_ok());
        article.price = PRICE_MAX + Decimal::new(1, 2);
        assert_eq!(fields(validate_article(&article)), vec!["price"]);
    }

    #[test]
    fn test_image_rules() {
        let mut article = input();
        article.images = vec!["ftp://x/a.jpg".to_string(), "not a url".to_string()];
        assert_eq!(fields(validate_article(&article)), vec!["images[0]", "images[1]"]);

        article.images = vec!["https://x/a.jpg".to_string(); MAX_IMAGES + 1];
        assert_eq!(fields(validate_article(&article)), vec!["images"]);
    }

    #[test]
    fn test_registration_rules() {
        assert!(validate_registration("marie@example.fr", "Marie", "motdepasse").is_ok());
        assert_eq!(
            fields(validate_registration("marie", "M", "short")),
            vec!["email", "name", "password"]
        );
    }
}
