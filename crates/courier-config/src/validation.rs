// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.

use courier_core::CourierError;

use crate::model::CourierConfig;

/// Validate constraints Figment cannot express in the type system.
pub fn validate_config(config: &CourierConfig) -> Result<(), CourierError> {
    if config.server.host.is_empty() {
        return Err(CourierError::Config("server.host must not be empty".into()));
    }

    for (key, path) in [
        ("storage.database_path", &config.storage.database_path),
        ("counters.database_path", &config.counters.database_path),
        ("search.database_path", &config.search.database_path),
    ] {
        if path.is_empty() {
            return Err(CourierError::Config(format!("{key} must not be empty")));
        }
    }

    // The three stores fail independently; sharing a file would couple them.
    if config.storage.database_path == config.counters.database_path
        || config.storage.database_path == config.search.database_path
        || config.counters.database_path == config.search.database_path
    {
        return Err(CourierError::Config(
            "storage, counters, and search must use distinct database paths".into(),
        ));
    }

    if config.runner.workers == 0 {
        return Err(CourierError::Config("runner.workers must be at least 1".into()));
    }

    if config.runner.max_attempts < 1 {
        return Err(CourierError::Config(
            "runner.max_attempts must be at least 1".into(),
        ));
    }

    match config.log.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        other => {
            return Err(CourierError::Config(format!(
                "log.level must be one of trace/debug/info/warn/error, got {other:?}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourierConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&CourierConfig::default()).is_ok());
    }

    #[test]
    fn rejects_zero_workers() {
        let mut config = CourierConfig::default();
        config.runner.workers = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_shared_database_paths() {
        let mut config = CourierConfig::default();
        config.counters.database_path = config.storage.database_path.clone();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = CourierConfig::default();
        config.log.level = "verbose".into();
        assert!(validate_config(&config).is_err());
    }
}
