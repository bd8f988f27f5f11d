//! Login and registration forms with client-side validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;
/// Minimum username length, in characters.
pub const MIN_USERNAME_LEN: usize = 3;

/// Credentials for `POST /login`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    pub username_or_email: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username_or_email", &self.username_or_email)
            .field("password", &"***")
            .finish()
    }
}

/// Registration form. `confirm_password` never leaves the client.
#[derive(Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .field("confirm_password", &"***")
            .finish()
    }
}

/// Body of `POST /register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Form field an error is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    Email,
    Password,
    ConfirmPassword,
    /// Errors not tied to a single field (e.g. server rejection).
    General,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirm_password",
            Field::General => "general",
        };
        f.write_str(name)
    }
}

/// Validation errors keyed per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, m)| format!("{k}: {m}")).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

impl FieldErrors {
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Clear one field's error, as happens when the user edits it.
    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl RegisterForm {
    /// Run every check; all failures are reported together.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.password != self.confirm_password {
            errors.insert(Field::ConfirmPassword, "Passwords do not match");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                Field::Password,
                format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
            );
        }
        if self.username.chars().count() < MIN_USERNAME_LEN {
            errors.insert(
                Field::Username,
                format!("Username must be at least {MIN_USERNAME_LEN} characters long"),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn to_request(&self) -> RegisterRequest<'_> {
        RegisterRequest {
            username: &self.username,
            email: &self.email,
            password: &self.password,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            email: "a@example.com".into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(form("alice", "longenough", "longenough").validate().is_ok());
    }

    #[test]
    fn confirm_mismatch_rejected() {
        let errs = form("alice", "longenough", "different1").validate().unwrap_err();
        assert_eq!(errs.get(Field::ConfirmPassword), Some("Passwords do not match"));
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn short_password_rejected() {
        let errs = form("alice", "short", "short").validate().unwrap_err();
        assert!(errs.contains(Field::Password));
        assert!(!errs.contains(Field::ConfirmPassword));
    }

    #[test]
    fn short_username_rejected() {
        let errs = form("al", "longenough", "longenough").validate().unwrap_err();
        assert_eq!(
            errs.get(Field::Username),
            Some("Username must be at least 3 characters long")
        );
    }

    #[test]
    fn all_checks_fire_together() {
        let errs = form("a", "abc", "xyz").validate().unwrap_err();
        assert_eq!(errs.len(), 3);
        assert!(errs.contains(Field::Username));
        assert!(errs.contains(Field::Password));
        assert!(errs.contains(Field::ConfirmPassword));
    }

    #[test]
    fn lengths_count_characters() {
        // three multi-byte characters
        assert!(form("äöü", "ééééééééé", "ééééééééé").validate().is_ok());
    }

    #[test]
    fn register_request_omits_confirmation() {
        let f = form("alice", "longenough", "longenough");
        let body = serde_json::to_value(f.to_request()).unwrap();
        assert!(body.get("confirm_password").is_none());
        assert_eq!(body["username"], "alice");
    }

    #[test]
    fn debug_masks_passwords() {
        let f = form("alice", "hunter22", "hunter22");
        assert!(!format!("{f:?}").contains("hunter22"));
    }
}
