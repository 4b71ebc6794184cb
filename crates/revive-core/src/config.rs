// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-stage pipeline configuration. All configs are plain immutable values
// supplied once per run; the orchestrator may substitute a concrete denoise
// strength per file when a camera profile recommends one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tone and color enhancement parameters.
///
/// Every parameter at its identity value (contrast 1.0, exposure 0.0,
/// saturation 1.0, shadows 0.0, highlights 0.0, curve off) makes the
/// corresponding step an exact no-op.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancementConfig {
    /// Contrast multiplier around the 0.5 midpoint.
    pub contrast: f32,
    /// Exposure compensation in stops (multiplies by `2^exposure`).
    pub exposure: f32,
    /// Saturation multiplier applied in HSV space.
    pub saturation: f32,
    /// Shadow lift amount in [0, 1]; quadratic falloff toward midtones.
    pub shadows: f32,
    /// Highlight compression amount in [0, 1]; soft-knee roll-off.
    pub highlights: f32,
    /// Apply the subtle midtone S-curve.
    pub curve: bool,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            contrast: 1.1,
            exposure: 0.0,
            saturation: 1.05,
            shadows: 0.0,
            highlights: 0.0,
            curve: true,
        }
    }
}

impl EnhancementConfig {
    /// A configuration where every step is a no-op.
    pub fn identity() -> Self {
        Self {
            contrast: 1.0,
            exposure: 0.0,
            saturation: 1.0,
            shadows: 0.0,
            highlights: 0.0,
            curve: false,
        }
    }
}

/// Requested denoise strength category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenoiseStrength {
    Off,
    Light,
    Medium,
    Strong,
    /// Defer to the profile's ISO recommendation, or to content-based
    /// estimation when no profile/ISO is available.
    Auto,
}

impl DenoiseStrength {
    /// Fixed filter-strength parameter `h` for a concrete category.
    ///
    /// `Auto` has no fixed parameter; the estimator supplies one at runtime.
    pub fn filter_strength(self) -> Option<u8> {
        match self {
            DenoiseStrength::Off => Some(0),
            DenoiseStrength::Light => Some(3),
            DenoiseStrength::Medium => Some(6),
            DenoiseStrength::Strong => Some(10),
            DenoiseStrength::Auto => None,
        }
    }
}

impl fmt::Display for DenoiseStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DenoiseStrength::Off => "off",
            DenoiseStrength::Light => "light",
            DenoiseStrength::Medium => "medium",
            DenoiseStrength::Strong => "strong",
            DenoiseStrength::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for DenoiseStrength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(DenoiseStrength::Off),
            "light" => Ok(DenoiseStrength::Light),
            "medium" => Ok(DenoiseStrength::Medium),
            "strong" => Ok(DenoiseStrength::Strong),
            "auto" => Ok(DenoiseStrength::Auto),
            other => Err(format!(
                "unknown denoise strength '{other}' (expected off|light|medium|strong|auto)"
            )),
        }
    }
}

/// Denoiser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenoiseConfig {
    pub strength: DenoiseStrength,
    /// Blend a lighter pass along detected edges to preserve detail.
    pub preserve_detail: bool,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            strength: DenoiseStrength::Auto,
            preserve_detail: true,
        }
    }
}

impl DenoiseConfig {
    /// This config but with a different strength category.
    pub fn with_strength(self, strength: DenoiseStrength) -> Self {
        Self { strength, ..self }
    }
}

/// Edge-aware unsharp sharpening parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SharpenConfig {
    /// Nominal sharpening strength; 0 disables sharpening entirely.
    pub strength: f32,
    /// Unsharp radius; the blur sigma is `radius * 2`.
    pub radius: f32,
    /// Minimum mean residual, in 8-bit units, for full-strength sharpening.
    /// Scaled to the source depth internally.
    pub threshold: u32,
}

impl Default for SharpenConfig {
    fn default() -> Self {
        Self {
            strength: 1.0,
            radius: 1.0,
            threshold: 3,
        }
    }
}

// -- Tests --------------------------------------------------------------------
