// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Courier messaging backend.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use courier_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::CourierConfig;

use courier_core::CourierError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. Runs post-deserialization validation
pub fn load_and_validate() -> Result<CourierConfig, CourierError> {
    let config = loader::load_config().map_err(|e| CourierError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a specific TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<CourierConfig, CourierError> {
    let config =
        loader::load_config_from_str(toml_content).map_err(|e| CourierError::Config(e.to_string()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = load_and_validate_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.runner.workers, 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_and_validate_str("[server]\nhost = \"0.0.0.0\"\nbogus = 1\n");
        assert!(result.is_err(), "unknown key should fail extraction");
    }

    #[test]
    fn invalid_section_value_is_rejected() {
        let result = load_and_validate_str("[runner]\nworkers = 0\n");
        assert!(result.is_err(), "zero workers should fail validation");
    }
}
