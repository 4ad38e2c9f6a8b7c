//! Input checks for the account forms.

use crate::req::RegisterRequest;

pub const PHONE_DIGITS: usize = 10;
pub const MIN_PASSWORD_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required.")]
    Missing(&'static str),
    #[error("Phone number must be exactly 10 digits.")]
    Phone,
    #[error(
        "Password must be at least 7 characters long and include at least one letter and one number."
    )]
    WeakPassword,
    #[error("Passwords do not match!")]
    PasswordMismatch,
}

/// Account identifiers are compared trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trimmed value, `None` when absent or blank.
pub fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == PHONE_DIGITS && phone.chars().all(|c| c.is_ascii_digit())
}

/// Letters and digits only, at least one of each.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().all(|c| c.is_ascii_alphanumeric())
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Checks a registration form before it is submitted. Returns every problem
/// found, in form order.
pub fn validate_registration(
    form: &RegisterRequest,
    confirm_password: &str,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = vec![];

    if required(form.school_email.as_deref()).is_none() {
        errors.push(ValidationError::Missing("Email"));
    }
    if !form.phone_number.as_deref().is_some_and(is_valid_phone) {
        errors.push(ValidationError::Phone);
    }

    let password = form.password.as_deref().unwrap_or_default();
    if !is_valid_password(password) {
        errors.push(ValidationError::WeakPassword);
    }
    if password != confirm_password {
        errors.push(ValidationError::PasswordMismatch);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
