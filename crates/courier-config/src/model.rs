// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier messaging backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Relational entity store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Counter store settings.
    #[serde(default)]
    pub counters: CountersConfig,

    /// Search index settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Async task runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Relational entity store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the entity store database file.
    #[serde(default = "default_storage_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "courier.db".to_string()
}

/// Counter store configuration.
///
/// The counter store lives in its own database file so that sequence
/// allocation stays available and atomic independently of the entity
/// store's transaction load.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CountersConfig {
    /// Path to the counter store database file.
    #[serde(default = "default_counters_path")]
    pub database_path: String,
}

impl Default for CountersConfig {
    fn default() -> Self {
        Self {
            database_path: default_counters_path(),
        }
    }
}

fn default_counters_path() -> String {
    "courier-counters.db".to_string()
}

/// Search index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Path to the search index database file.
    #[serde(default = "default_search_path")]
    pub database_path: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            database_path: default_search_path(),
        }
    }
}

fn default_search_path() -> String {
    "courier-search.db".to_string()
}

/// Async task runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Number of worker tasks consuming the queue.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Attempt budget per task before it moves to the dead-letter state.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// Base retry backoff in milliseconds; attempt N waits `base * 2^N`.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// How long an idle worker sleeps before polling the queue again.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            retry_base_ms: default_retry_base_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_max_attempts() -> i64 {
    3
}

fn default_retry_base_ms() -> u64 {
    200
}

fn default_poll_interval_ms() -> u64 {
    100
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
