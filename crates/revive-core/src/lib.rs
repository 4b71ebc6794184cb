// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Revive — Core raster types, stage configurations, and error definitions
// shared across all crates.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DenoiseConfig, DenoiseStrength, EnhancementConfig, SharpenConfig};
pub use error::{ReviveError, Result};
pub use types::*;
