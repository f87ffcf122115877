// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `assembly` - model flattening events
//! * `config` - constants loading
//! * `engine` - evaluation and differentiation events
//! * `verification` - derivative check results

pub mod assembly;
pub mod config;
pub mod engine;
pub mod verification;

use tracing::Span;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// A span carrying the same fields, for work done on behalf of the event.
    fn span(&self, name: &str) -> Span;
}
