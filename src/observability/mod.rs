// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic the crate emits is a message struct with a `Display`
//! implementation and a [`messages::StructuredLog`] implementation that
//! chooses the level and attaches structured fields. Call sites never build
//! log strings themselves.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::assembly` - model flattening and name resolution
//! * `messages::config` - constants files
//! * `messages::engine` - runs and derivative sweeps
//! * `messages::verification` - partial and total derivative checks
//!
//! # Usage
//!
//! ```rust
//! use tokamak_mdo::observability::messages::engine::RunCompleted;
//! use tokamak_mdo::observability::messages::StructuredLog;
//! use std::time::Duration;
//!
//! RunCompleted {
//!     components: 12,
//!     duration: Duration::from_micros(80),
//! }
//! .log();
//! ```

pub mod messages;
