//! Typed value conversion for config values.

use bstr::{BStr, ByteSlice};
use crate::error::ConfigError;

/// Parse a boolean config value.
///
/// - None (key with no `=`) → true
/// - "" (empty string) → false
/// - "true", "yes", "on" (case-insensitive) → true
/// - "false", "no", "off" (case-insensitive) → false
/// - any other integer → true unless it is exactly `0`
pub fn parse_bool(value: Option<&BStr>) -> Result<bool, ConfigError> {
    match value {
        None => Ok(true),
        Some(v) => {
            let s = v.to_str_lossy();
            let s = s.trim();
            if s.is_empty() {
                return Ok(false);
            }
            match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(true),
                "false" | "no" | "off" => Ok(false),
                _ => match s.parse::<i64>() {
                    Ok(0) => Ok(false),
                    Ok(_) => Ok(true),
                    Err(_) => Err(ConfigError::InvalidBool(s.to_string())),
                },
            }
        }
    }
}
