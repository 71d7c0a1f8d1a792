// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequence allocation and token generation for the Courier messaging
//! backend.
//!
//! Both features sit on top of the counter store, an atomic key/value
//! database independent of the relational entity store. Sequence numbers
//! for chats and messages are handed out synchronously on the request
//! path; tokens identify applications externally and are deduplicated
//! against a bounded tracking set.

pub mod allocator;
pub mod store;
pub mod token;

pub use allocator::{Scope, SequenceAllocator};
pub use store::SqliteCounters;
pub use token::TokenGenerator;
