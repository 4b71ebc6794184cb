// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camera correction profiles — per-camera optical/color coefficients and a
// noise-vs-ISO table. Pure data with a matching predicate; constructed once
// and shared read-only across all rasters processed with that profile.

use serde::{Deserialize, Serialize};

use revive_core::error::{Result, ReviveError};
use revive_core::DenoiseStrength;

/// One entry of the noise-vs-sensitivity table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoisePoint {
    /// ISO sensitivity.
    pub iso: u32,
    /// Expected noise sigma at that ISO (8-bit luminance units).
    pub sigma: f32,
}

/// Optical and color characteristics of one camera family.
///
/// Coefficients of (near-)zero make the corresponding correction sub-stage a
/// no-op, so a profile only needs to specify what its camera actually
/// exhibits. Serializable so ad-hoc profiles can be loaded from JSON and
/// registered alongside the built-ins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionProfile {
    /// Display name, e.g. "Sony RX1R".
    pub name: String,
    /// Manufacturer substring used for auto-detection (case-insensitive).
    #[serde(default)]
    pub make: String,
    /// Model substring used for auto-detection (case-insensitive).
    #[serde(default)]
    pub model: String,

    /// Radial distortion coefficient `k1` (negative = barrel).
    #[serde(default)]
    pub distortion_k1: f32,
    /// Vignette correction strength; brightens corners by `1 + strength * d^2`.
    #[serde(default)]
    pub vignette_strength: f32,
    /// Horizontal cyan-red gradient cast strength.
    #[serde(default)]
    pub gradient_cast_strength: f32,
    /// Red-channel shift applied in shadows (negative cools warm shadows).
    #[serde(default)]
    pub shadow_warmth: f32,
    /// Blue reduction where green dominates, proportional to green.
    #[serde(default)]
    pub green_blue_shift: f32,
    /// Corner chromatic-aberration reduction strength in [0, 1].
    #[serde(default)]
    pub chromatic_aberration: f32,

    /// ISO -> expected noise sigma, ordered ascending by ISO.
    #[serde(default)]
    pub noise_profile: Vec<NoisePoint>,
}

impl CorrectionProfile {
    /// Check whether this profile matches a camera make/model pair.
    ///
    /// Both the make and model substrings must occur (case-insensitively) in
    /// the corresponding metadata strings. An empty substring matches
    /// anything.
    pub fn matches(&self, make: &str, model: &str) -> bool {
        let make_up = make.to_uppercase();
        let model_up = model.to_uppercase();
        make_up.contains(&self.make.to_uppercase()) && model_up.contains(&self.model.to_uppercase())
    }

    /// Recommended denoise strength for a given ISO.
    ///
    /// A simple threshold ladder: low sensitivities need no denoising at
    /// all, and the steps up track how quickly sensor noise grows.
    pub fn recommended_denoise(&self, iso: u32) -> DenoiseStrength {
        if iso <= 400 {
            DenoiseStrength::Off
        } else if iso <= 1600 {
            DenoiseStrength::Light
        } else if iso <= 6400 {
            DenoiseStrength::Medium
        } else {
            DenoiseStrength::Strong
        }
    }

    /// Expected noise sigma at `iso`, linearly interpolated between table
    /// entries and clamped at the table ends. Returns `None` for an empty
    /// table.
    pub fn expected_noise_sigma(&self, iso: u32) -> Option<f32> {
        let table = &self.noise_profile;
        let first = table.first()?;
        if iso <= first.iso {
            return Some(first.sigma);
        }
        let last = table.last()?;
        if iso >= last.iso {
            return Some(last.sigma);
        }
        for pair in table.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if iso >= lo.iso && iso <= hi.iso {
                let span = (hi.iso - lo.iso) as f32;
                let t = (iso - lo.iso) as f32 / span;
                return Some(lo.sigma + t * (hi.sigma - lo.sigma));
            }
        }
        None
    }

    /// Validate structural invariants: a non-empty noise table with strictly
    /// ascending ISO entries, and a non-empty display name.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ReviveError::ProfileFile("profile name is empty".into()));
        }
        if self.noise_profile.is_empty() {
            return Err(ReviveError::ProfileFile(format!(
                "profile '{}' has an empty noise table",
                self.name
            )));
        }
        for pair in self.noise_profile.windows(2) {
            if pair[1].iso <= pair[0].iso {
                return Err(ReviveError::ProfileFile(format!(
                    "profile '{}': noise table ISO entries must be strictly ascending \
                     ({} followed by {})",
                    self.name, pair[0].iso, pair[1].iso
                )));
            }
        }
        Ok(())
    }

    // -- Built-in profiles ----------------------------------------------------

    /// The Sony RX1R full-frame compact with its fixed Zeiss 35mm f/2.
    ///
    /// Corrects the lens's slight barrel distortion and the pronounced
    /// corner falloff wide open. The color-cast coefficients are still at
    /// zero pending calibration.
    pub fn sony_rx1r() -> Self {
        Self {
            name: "Sony RX1R".into(),
            make: "Sony".into(),
            model: "RX1R".into(),
            distortion_k1: -0.008,
            vignette_strength: 0.15,
            gradient_cast_strength: 0.0,
            shadow_warmth: 0.0,
            green_blue_shift: 0.0,
            chromatic_aberration: 1.0,
            noise_profile: vec![
                NoisePoint { iso: 100, sigma: 1.0 },
                NoisePoint { iso: 200, sigma: 1.5 },
                NoisePoint { iso: 400, sigma: 2.5 },
                NoisePoint { iso: 800, sigma: 4.0 },
                NoisePoint { iso: 1600, sigma: 6.0 },
                NoisePoint { iso: 3200, sigma: 9.0 },
                NoisePoint { iso: 6400, sigma: 14.0 },
                NoisePoint { iso: 12800, sigma: 22.0 },
                NoisePoint { iso: 25600, sigma: 35.0 },
            ],
        }
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive_substring() {
        let profile = CorrectionProfile::sony_rx1r();
        assert!(profile.matches("SONY", "DSC-RX1R"));
        assert!(profile.matches("sony corporation", "rx1r"));
        assert!(!profile.matches("Canon", "EOS 6D"));
        assert!(!profile.matches("Sony", "A7R"));
    }

    /// The ISO -> strength ladder from the profile recommendation.
    #[test]
    fn denoise_ladder_thresholds() {
        let profile = CorrectionProfile::sony_rx1r();
        assert_eq!(profile.recommended_denoise(100), DenoiseStrength::Off);
        assert_eq!(profile.recommended_denoise(400), DenoiseStrength::Off);
        assert_eq!(profile.recommended_denoise(800), DenoiseStrength::Light);
        assert_eq!(profile.recommended_denoise(1600), DenoiseStrength::Light);
        assert_eq!(profile.recommended_denoise(3200), DenoiseStrength::Medium);
        assert_eq!(profile.recommended_denoise(6400), DenoiseStrength::Medium);
        assert_eq!(profile.recommended_denoise(12800), DenoiseStrength::Strong);
    }

    #[test]
    fn noise_sigma_interpolates_and_clamps() {
        let profile = CorrectionProfile::sony_rx1r();
        // Exact table entries.
        assert_eq!(profile.expected_noise_sigma(100), Some(1.0));
        assert_eq!(profile.expected_noise_sigma(1600), Some(6.0));
        // Midway between 800 (4.0) and 1600 (6.0).
        assert_eq!(profile.expected_noise_sigma(1200), Some(5.0));
        // Clamped outside the table.
        assert_eq!(profile.expected_noise_sigma(50), Some(1.0));
        assert_eq!(profile.expected_noise_sigma(102_400), Some(35.0));
    }

    #[test]
    fn validate_rejects_empty_and_unsorted_tables() {
        let mut profile = CorrectionProfile::sony_rx1r();
        profile.noise_profile.clear();
        assert!(profile.validate().is_err());

        let mut profile = CorrectionProfile::sony_rx1r();
        profile.noise_profile.swap(0, 1);
        assert!(profile.validate().is_err());

        assert!(CorrectionProfile::sony_rx1r().validate().is_ok());
    }

    /// Profiles round-trip through JSON, and omitted coefficients default
    /// to zero (no-op sub-stages).
    #[test]
    fn profile_json_round_trip_and_defaults() {
        let profile = CorrectionProfile::sony_rx1r();
        let json = serde_json::to_string(&profile).unwrap();
        let back: CorrectionProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(profile, back);

        let partial: CorrectionProfile = serde_json::from_str(
            r#"{"name": "Test Cam", "noise_profile": [{"iso": 100, "sigma": 1.0}]}"#,
        )
        .unwrap();
        assert_eq!(partial.distortion_k1, 0.0);
        assert_eq!(partial.vignette_strength, 0.0);
        assert!(partial.validate().is_ok());
    }
}
