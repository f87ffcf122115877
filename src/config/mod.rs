// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod accessor;
mod loader;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use accessor::{Config, ConfigAccessor, ConfigValue, ScopedConfig};
pub use loader::{load_config, load_constants};
