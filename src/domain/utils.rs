//! Argument coercion shared by the MCP and REST front ends

use chrono::NaiveDate;
use serde_json::Value;

use crate::errors::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepts a JSON integer or a string holding one.
pub fn normalize_integer(name: &str, value: &Value) -> Result<i64, AppError> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        AppError::bad_request("invalid_parameter", format!("{name} must be an integer"))
    })
}

pub fn normalize_date(name: &str, value: &Value) -> Result<NaiveDate, AppError> {
    value
        .as_str()
        .and_then(|text| NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok())
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_parameter",
                format!("{name} must be a date in YYYY-MM-DD format"),
            )
        })
}

pub fn normalize_text(name: &str, value: &Value) -> Result<String, AppError> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::bad_request(
                "invalid_parameter",
                format!("{name} must be a non-empty string"),
            )
        })
}
