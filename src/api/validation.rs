use chrono::NaiveDate;

use super::ApiError;
use crate::models::Gender;

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation("Invalid email address"));
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || trimmed.contains(' ') {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(trimmed)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }

    if trimmed.len() > 30 {
        return Err(ApiError::validation(
            "Username must be 30 characters or less",
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, dots, and underscores",
        ));
    }

    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(password)
}

pub fn validate_full_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Full name cannot be empty"));
    }
    if trimmed.len() > 100 {
        return Err(ApiError::validation(
            "Full name must be 100 characters or less",
        ));
    }
    Ok(trimmed)
}

pub fn parse_gender(value: &str) -> Result<Gender, ApiError> {
    value.parse().map_err(ApiError::validation)
}

pub fn parse_dob(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation("Date of birth must be formatted as YYYY-MM-DD"))
}

pub fn validate_otp_code(code: &str) -> Result<&str, ApiError> {
    let trimmed = code.trim();
    if trimmed.len() != 6 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation("OTP must be 6 digits"));
    }
    Ok(trimmed)
}
