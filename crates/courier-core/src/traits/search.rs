// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search index trait: the best-effort full-text projection of messages.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::adapter::BackendAdapter;
use crate::types::{SearchDocument, SearchHit};

/// Adapter for the full-text message index.
///
/// The index is a secondary projection: it is written after the
/// authoritative message transaction commits, indexing failures never
/// fail the write path, and `setup` exists as the rebuild escape hatch
/// when index and store diverge.
#[async_trait]
pub trait SearchIndex: BackendAdapter {
    /// Create the index schema, dropping any existing index of the same
    /// name first. Idempotent.
    async fn setup(&self) -> Result<(), CourierError>;

    /// Upsert one document, keyed by
    /// `(application_token, chat_number, message_number)` so redelivered
    /// indexing work cannot duplicate a hit.
    async fn index(&self, document: &SearchDocument) -> Result<(), CourierError>;

    /// Full-text search within one chat of one application.
    ///
    /// The tenant and chat filters are exact matches; `query` is matched
    /// phrase-prefix against the analyzed body. Results are ordered by
    /// relevance descending, then timestamp descending.
    async fn search(
        &self,
        application_token: &str,
        chat_number: i64,
        query: &str,
    ) -> Result<Vec<SearchHit>, CourierError>;
}
