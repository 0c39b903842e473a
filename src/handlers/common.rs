use crate::error::{AppError, AppResult};
use crate::models::Sex;

/// Trim a text field; empty or whitespace-only counts as absent.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn require_text(field: &str, value: String) -> AppResult<String> {
    normalize_text(Some(value))
        .ok_or_else(|| AppError::InvalidRequest(format!("{} is required", field)))
}

pub fn parse_sex(value: Option<String>) -> AppResult<Option<Sex>> {
    normalize_text(value)
        .map(|v| v.parse::<Sex>().map_err(AppError::InvalidRequest))
        .transpose()
}

pub fn validate_age(age: Option<i32>) -> AppResult<Option<i32>> {
    match age {
        Some(a) if a < 0 => Err(AppError::InvalidRequest(
            "age must not be negative".to_string(),
        )),
        other => Ok(other),
    }
}

/// Parse an optional numeric query parameter. Unparsable input counts as absent.
pub fn parse_number<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    normalize_text(value).and_then(|v| v.parse::<T>().ok())
}
