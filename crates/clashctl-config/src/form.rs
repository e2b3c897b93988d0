//! Field-level checks for server input.
//!
//! Each validator returns [`ConfigError::Validation`] with a message short
//! enough to show next to the prompt that asked for the value.

use crate::{ConfigError, CtlConfig};

/// A server name must be non-empty and not already configured.
pub fn validate_name(input: &str, config: &CtlConfig) -> Result<(), ConfigError> {
    if input.is_empty() {
        return Err(ConfigError::Validation("name is required".to_string()));
    }
    if input.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(
            "name must not contain whitespace".to_string(),
        ));
    }
    if config.servers.contains_key(input) {
        return Err(ConfigError::Validation(format!("name `{input}` already exists")));
    }
    Ok(())
}

/// An address must be non-empty.
pub fn validate_host(input: &str) -> Result<(), ConfigError> {
    if input.is_empty() {
        return Err(ConfigError::Validation("address is required".to_string()));
    }
    Ok(())
}

/// Parse a port number.
pub fn parse_port(input: &str) -> Result<u16, ConfigError> {
    match input.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ConfigError::Validation(
            "port must be an integer between 1 and 65535".to_string(),
        )),
        Ok(port) => Ok(port),
    }
}

/// Parse a `y`/`n` answer. Empty means `n`.
pub fn parse_https(input: &str) -> Result<bool, ConfigError> {
    match input.trim().to_lowercase().as_str() {
        "y" => Ok(true),
        "n" | "" => Ok(false),
        _ => Err(ConfigError::Validation(
            "value must be y, n or empty (n)".to_string(),
        )),
    }
}
