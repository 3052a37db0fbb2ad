//! Registration form validation.
//!
//! Stateless per-field rules shared by the register endpoint and mirrored by
//! the frontend form. Validation never fails; it reports reasons.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::FieldError;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

pub const MIN_FULL_NAME_LEN: usize = 2;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Fields of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FullName,
    Login,
    Password,
    ConfirmPassword,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::FullName,
        Field::Login,
        Field::Password,
        Field::ConfirmPassword,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::FullName => "full_name",
            Field::Login => "login",
            Field::Password => "password",
            Field::ConfirmPassword => "confirm_password",
        }
    }
}

/// Check one field. `password` is only consulted for the confirmation.
pub fn validate_field(field: Field, value: &str, password: &str) -> Result<(), &'static str> {
    match field {
        Field::FullName => {
            let value = value.trim();
            if value.is_empty() {
                Err("Full name is required")
            } else if value.chars().count() < MIN_FULL_NAME_LEN {
                Err("Full name must be at least 2 characters")
            } else {
                Ok(())
            }
        }
        Field::Login => {
            if value.trim().is_empty() {
                Err("Email is required")
            } else if !EMAIL_SHAPE.is_match(value.trim()) {
                Err("Enter a valid email address")
            } else {
                Ok(())
            }
        }
        Field::Password => {
            if value.is_empty() {
                Err("Password is required")
            } else if value.chars().count() < MIN_PASSWORD_LEN {
                Err("Password must be at least 6 characters")
            } else {
                Ok(())
            }
        }
        Field::ConfirmPassword => {
            if value != password {
                Err("Passwords do not match")
            } else {
                Ok(())
            }
        }
    }
}

/// Values entered in the registration form.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub login: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    fn value(&self, field: Field) -> &str {
        match field {
            Field::FullName => &self.full_name,
            Field::Login => &self.login,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
        }
    }

    /// Run every field rule; an empty result means the form is valid.
    pub fn validate(&self) -> Vec<FieldError> {
        Field::ALL
            .iter()
            .filter_map(|&field| {
                validate_field(field, self.value(field), &self.password)
                    .err()
                    .map(|reason| FieldError::new(field.name(), reason))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            full_name: "Anna Petrova".to_string(),
            login: "anna@example.org".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[test]
    fn test_login_shape() {
        assert!(validate_field(Field::Login, "not-an-email", "").is_err());
        assert!(validate_field(Field::Login, "a@b.co", "").is_ok());
        assert!(validate_field(Field::Login, "a@b", "").is_err());
        assert_eq!(
            validate_field(Field::Login, "", ""),
            Err("Email is required")
        );
    }

    #[test]
    fn test_password_length() {
        assert!(validate_field(Field::Password, "12345", "").is_err());
        assert!(validate_field(Field::Password, "123456", "").is_ok());
        assert_eq!(
            validate_field(Field::Password, "", ""),
            Err("Password is required")
        );
    }

    #[test]
    fn test_full_name() {
        assert!(validate_field(Field::FullName, "  ", "").is_err());
        assert!(validate_field(Field::FullName, "A", "").is_err());
        assert!(validate_field(Field::FullName, "Ян", "").is_ok());
    }

    #[test]
    fn test_confirmation_mismatch_has_specific_reason() {
        assert_eq!(
            validate_field(Field::ConfirmPassword, "secret2", "secret1"),
            Err("Passwords do not match")
        );
        assert!(validate_field(Field::ConfirmPassword, "secret1", "secret1").is_ok());
    }

    #[test]
    fn test_whole_form_reports_every_failure() {
        assert!(valid_form().validate().is_empty());

        let form = RegistrationForm {
            full_name: "A".to_string(),
            login: "not-an-email".to_string(),
            password: "12345".to_string(),
            confirm_password: "54321".to_string(),
        };
        let fields: Vec<String> = form.validate().into_iter().map(|f| f.field).collect();
        assert_eq!(
            fields,
            vec!["full_name", "login", "password", "confirm_password"]
        );

        let mut form = valid_form();
        form.confirm_password = "other".to_string();
        let errors = form.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].reason, "Passwords do not match");
    }
}
