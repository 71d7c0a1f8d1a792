// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task definitions for the asynchronous write path.

use courier_core::CourierError;
use serde::{Deserialize, Serialize};

/// Queue all entity-creation tasks flow through.
pub const WRITE_QUEUE: &str = "writes";

/// One deferred write, carrying exactly the data needed to replay it.
///
/// Parents are referenced by external identity (token, chat number)
/// rather than internal row ids: the task must stay replayable against
/// whatever the store holds at execution time, not at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    CreateApplication {
        name: String,
        token: String,
    },
    CreateChat {
        application_token: String,
        number: i64,
    },
    SendMessage {
        application_token: String,
        chat_number: i64,
        number: i64,
        body: String,
    },
}

impl Task {
    /// Serialize for the queue payload column.
    pub fn to_payload(&self) -> Result<String, CourierError> {
        serde_json::to_string(self)
            .map_err(|e| CourierError::Internal(format!("task serialization failed: {e}")))
    }

    /// Parse a queue payload. Failure is deterministic, so callers route
    /// it to the dead-letter state rather than the retry path.
    pub fn from_payload(payload: &str) -> Result<Self, CourierError> {
        serde_json::from_str(payload)
            .map_err(|e| CourierError::Internal(format!("unparseable task payload: {e}")))
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateApplication { .. } => "create_application",
            Self::CreateChat { .. } => "create_chat",
            Self::SendMessage { .. } => "send_message",
        }
    }
}
