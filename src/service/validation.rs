//! Content-policy validation for write requests.

use crate::error::AppError;
use regex::Regex;

const TITLE_MIN: usize = 2;
const TITLE_MAX: usize = 255;
const BODY_MIN: usize = 200;
const BODY_MAX: usize = 1000;

/// Bodies may not open with this token.
const FORBIDDEN_BODY_PREFIX: &str = "Asla";

pub struct ContentPolicy;

impl ContentPolicy {
    /// Title and body rules for post create/update. Lengths are in characters;
    /// the body must not begin (after leading whitespace) with the forbidden
    /// token and must end (before trailing whitespace) with a full stop.
    pub fn validate_post(title: &str, body: &str) -> Result<(), AppError> {
        let title_len = title.chars().count();
        if title_len < TITLE_MIN {
            return Err(AppError::Validation(format!(
                "title must be at least {} characters",
                TITLE_MIN
            )));
        }
        if title_len > TITLE_MAX {
            return Err(AppError::Validation(format!(
                "title must be at most {} characters",
                TITLE_MAX
            )));
        }
        let body_len = body.chars().count();
        if body_len < BODY_MIN {
            return Err(AppError::Validation(format!(
                "body must be at least {} characters",
                BODY_MIN
            )));
        }
        if body_len > BODY_MAX {
            return Err(AppError::Validation(format!(
                "body must be at most {} characters",
                BODY_MAX
            )));
        }
        if body.trim_start().starts_with(FORBIDDEN_BODY_PREFIX) {
            return Err(AppError::Validation(format!(
                "body must not begin with '{}'",
                FORBIDDEN_BODY_PREFIX
            )));
        }
        if !body.trim_end().ends_with('.') {
            return Err(AppError::Validation("body must end with a full stop".into()));
        }
        Ok(())
    }

    /// Comments carry non-blank text.
    pub fn validate_comment_content(content: &str) -> Result<(), AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("comment content is blank".into()));
        }
        Ok(())
    }

    pub fn validate_email(email: &str) -> Result<(), AppError> {
        let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .map_err(|_| AppError::Validation("invalid email pattern".into()))?;
        if !re.is_match(email) {
            return Err(AppError::Validation("email must be a valid address".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(len: usize) -> String {
        let mut s = "x".repeat(len - 1);
        s.push('.');
        s
    }

    #[test]
    fn post_within_bounds_passes() {
        assert!(ContentPolicy::validate_post("ok", &body_of(200)).is_ok());
        assert!(ContentPolicy::validate_post(&"t".repeat(255), &body_of(1000)).is_ok());
    }

    #[test]
    fn title_bounds_are_enforced() {
        assert!(ContentPolicy::validate_post("a", &body_of(200)).is_err());
        assert!(ContentPolicy::validate_post(&"t".repeat(256), &body_of(200)).is_err());
    }

    #[test]
    fn body_bounds_are_enforced() {
        assert!(ContentPolicy::validate_post("ok", &body_of(199)).is_err());
        assert!(ContentPolicy::validate_post("ok", &body_of(1001)).is_err());
    }

    #[test]
    fn forbidden_prefix_is_rejected_even_after_whitespace() {
        let body = format!("  Asla{}.", "x".repeat(200));
        assert!(matches!(
            ContentPolicy::validate_post("ok", &body),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn body_must_end_with_full_stop() {
        let no_stop = "x".repeat(200);
        assert!(ContentPolicy::validate_post("ok", &no_stop).is_err());
        // trailing whitespace after the stop is fine
        let trailing = format!("{}. \n", "x".repeat(200));
        assert!(ContentPolicy::validate_post("ok", &trailing).is_ok());
    }

    #[test]
    fn blank_comment_content_is_rejected() {
        assert!(ContentPolicy::validate_comment_content("  \t\n").is_err());
        assert!(ContentPolicy::validate_comment_content("fine").is_ok());
    }

    #[test]
    fn email_shape_is_checked() {
        assert!(ContentPolicy::validate_email("a@x.com").is_ok());
        assert!(ContentPolicy::validate_email("not-an-email").is_err());
        assert!(ContentPolicy::validate_email("a b@x.com").is_err());
    }
}
