//! auth::validation
//!
//! Local checks run before any login or registration request.

use super::errors::AuthError;

/// Default minimum password length.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 4;

/// Input rules for login and registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Minimum password length, in characters.
    pub min_password_length: usize,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl ValidationPolicy {
    pub fn new(min_password_length: usize) -> Self {
        Self {
            min_password_length,
        }
    }

    /// Check login input.
    pub fn validate_login(&self, login_id: &str, password: &str) -> Result<(), AuthError> {
        require_non_blank(login_id, "Login")?;
        self.check_password(password)
    }

    /// Check registration input.
    pub fn validate_register(
        &self,
        login_id: &str,
        display_name: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        require_non_blank(login_id, "Login")?;
        require_non_blank(display_name, "Name")?;
        self.check_password(password)?;
        if password != confirm_password {
            return Err(AuthError::Validation("Passwords do not match.".into()));
        }
        Ok(())
    }

    fn check_password(&self, password: &str) -> Result<(), AuthError> {
        if password.trim().is_empty() {
            return Err(AuthError::Validation("Password must not be empty.".into()));
        }
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters.",
                self.min_password_length
            )));
        }
        Ok(())
    }
}

fn require_non_blank(value: &str, field: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!("{} must not be empty.", field)));
    }
    Ok(())
}
