//! Environment variable loading utilities
//!
//! Helper functions for loading and parsing environment variables with proper error handling.

use crate::{Result, ToolingError};
use std::env;
use std::str::FromStr;

/// Load an environment variable as a string
///
/// # Returns
///
/// * `Ok(Some(value))` if variable exists
/// * `Ok(None)` if variable doesn't exist
/// * `Err` if variable exists but has invalid UTF-8
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ToolingError::General(format!(
            "Environment variable {} contains invalid UTF-8",
            key
        ))),
    }
}

/// Load and parse an environment variable
///
/// # Returns
///
/// * `Ok(Some(value))` if variable exists and parses successfully
/// * `Ok(None)` if variable doesn't exist
/// * `Err` if variable exists but fails to parse
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_env(key)? {
        Some(val) => {
            let parsed = val.parse::<T>().map_err(|e| {
                ToolingError::General(format!(
                    "Failed to parse environment variable {}: {}",
                    key, e
                ))
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Load an environment variable with a default value
pub fn get_env_or(key: &str, default: impl Into<String>) -> Result<String> {
    Ok(get_env(key)?.unwrap_or_else(|| default.into()))
}

/// Load and parse an environment variable with a default value
pub fn get_env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(get_env_parse(key)?.unwrap_or(default))
}

/// Load a boolean environment variable
///
/// Recognizes: "true", "1", "yes", "on" (case-insensitive) as true
/// Recognizes: "false", "0", "no", "off" (case-insensitive) as false
pub fn get_env_bool(key: &str) -> Result<Option<bool>> {
    match get_env(key)? {
        Some(val) => {
            let lower = val.to_lowercase();
            let result = match lower.as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(ToolingError::General(format!(
                        "Invalid boolean value for {}: {}",
                        key, val
                    )))
                }
            };
            Ok(Some(result))
        }
        None => Ok(None),
    }
}

/// Load a boolean environment variable with a default value
pub fn get_env_bool_or(key: &str, default: bool) -> Result<bool> {
    Ok(get_env_bool(key)?.unwrap_or(default))
}
