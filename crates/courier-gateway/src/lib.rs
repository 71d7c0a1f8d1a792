// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Courier messaging backend.
//!
//! Exposes the `/v1` REST surface. Create endpoints are optimistic: they
//! validate, resolve the parent, allocate a sequence number, enqueue a
//! task, and return 201 with the allocated number before anything is
//! persisted. Durability is observable only through the list and search
//! endpoints; that eventual-consistency contract is part of the API, not
//! hidden behavior.

pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, GatewayState};
