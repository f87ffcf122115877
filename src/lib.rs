// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod components;    // physics library
pub mod config;        // constants + accessors
pub mod engine;        // evaluation and derivative driver
pub mod errors;        // error handling
pub mod jacobian;      // local Jacobians and strategies
pub mod model;         // groups and assembly
pub mod observability;
pub mod traits;        // unified abstractions
pub mod variables;     // variable metadata and values
