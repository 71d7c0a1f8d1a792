// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./courier.toml` > `~/.config/courier/courier.toml`
//! > `/etc/courier/courier.toml` with environment variable overrides via the
//! `COURIER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CourierConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/courier/courier.toml` (system-wide)
/// 3. `~/.config/courier/courier.toml` (user XDG config)
/// 4. `./courier.toml` (local directory)
/// 5. `COURIER_*` environment variables
pub fn load_config() -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file("/etc/courier/courier.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("courier/courier.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("courier.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CourierConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CourierConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example,
/// `COURIER_STORAGE_DATABASE_PATH` must map to `storage.database_path`,
/// not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("COURIER_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: COURIER_RUNNER_MAX_ATTEMPTS -> "runner_max_attempts"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("counters_", "counters.", 1)
            .replacen("search_", "search.", 1)
            .replacen("runner_", "runner.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_string_overrides_defaults() {
        let config = load_config_from_str(
            "[server]\nport = 9000\n\n[runner]\nworkers = 2\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.runner.workers, 2);
        // Untouched sections keep their defaults.
        assert_eq!(config.storage.database_path, "courier.db");
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.log.level, "info");
    }
}
