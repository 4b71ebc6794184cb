// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Revive.

use thiserror::Error;

/// Top-level error type for all Revive operations.
#[derive(Debug, Error)]
pub enum ReviveError {
    // -- Profile errors --
    #[error("unknown camera profile '{requested}'; registered profiles: {known}")]
    UnknownProfile { requested: String, known: String },

    #[error("invalid camera profile: {0}")]
    ProfileFile(String),

    // -- Pipeline errors --
    #[error("failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("degenerate raster: {0}")]
    NumericDegenerate(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- I/O / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReviveError>;
