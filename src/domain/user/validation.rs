//! User input validation

use crate::domain::validation::{matches, Validator, EMAIL_RX};

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(matches(email, &EMAIL_RX), "email", "must be a valid email address");
}

/// Password length is checked in bytes, argon2 input is capped at 72
pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(password.len() >= 8, "password", "must be at least 8 bytes long");
    v.check(password.len() <= 72, "password", "must not be more than 72 bytes long");
}

pub fn validate_user(v: &mut Validator, name: &str, email: &str, password: &str) {
    v.check(!name.is_empty(), "name", "must be provided");
    v.check(name.len() <= 500, "name", "must not be more than 500 bytes long");

    validate_email(v, email);
    validate_password_plaintext(v, password);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_user() {
        let mut v = Validator::new();
        validate_user(&mut v, "Alice", "alice@example.com", "pa55word");
        assert!(v.is_valid());
    }

    #[test]
    fn test_collects_every_field() {
        let mut v = Validator::new();
        validate_user(&mut v, "", "nope", "short");

        let errors = v.errors();
        assert_eq!(errors.get("name").map(String::as_str), Some("must be provided"));
        assert_eq!(
            errors.get("email").map(String::as_str),
            Some("must be a valid email address")
        );
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some("must be at least 8 bytes long")
        );
    }

    #[test]
    fn test_password_upper_bound() {
        let mut v = Validator::new();
        validate_password_plaintext(&mut v, &"x".repeat(73));
        assert_eq!(
            v.errors().get("password").map(String::as_str),
            Some("must not be more than 72 bytes long")
        );
    }

    #[test]
    fn test_empty_email_reports_missing_first() {
        let mut v = Validator::new();
        validate_email(&mut v, "");
        assert_eq!(v.errors().get("email").map(String::as_str), Some("must be provided"));
    }
}
