// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline orchestrator — resolves per-file parameters from metadata and a
// profile registry in one pure decision step, then sequences the stages:
// camera corrections, denoise, tone enhancement, sharpening.

use tracing::{debug, info, instrument};

use revive_core::error::{Result, ReviveError};
use revive_core::{DenoiseConfig, DenoiseStrength, EnhancementConfig, Metadata, Raster, SharpenConfig};

use crate::correction::CameraCorrectionEngine;
use crate::denoise::Denoiser;
use crate::enhance::ToneEnhancer;
use crate::profile::CorrectionProfile;
use crate::registry::ProfileRegistry;
use crate::sharpen::EdgeAwareSharpener;

/// Concrete per-file parameters, resolved before any stage runs.
#[derive(Debug)]
pub struct ResolvedParams<'a> {
    /// The correction profile to apply, if one was selected or detected.
    pub profile: Option<&'a CorrectionProfile>,
    /// The denoise configuration with `auto` replaced by the profile's
    /// ISO recommendation where available.
    pub denoise: DenoiseConfig,
}

/// Sequences the correction and enhancement stages for each raster.
///
/// Holds only read-only configuration, so one orchestrator can be shared
/// across worker threads and rasters processed concurrently without
/// locking.
pub struct PipelineOrchestrator {
    registry: ProfileRegistry,
    enhancement: EnhancementConfig,
    denoise: DenoiseConfig,
    sharpen: SharpenConfig,
}

impl PipelineOrchestrator {
    pub fn new(
        registry: ProfileRegistry,
        enhancement: EnhancementConfig,
        denoise: DenoiseConfig,
        sharpen: SharpenConfig,
    ) -> Self {
        Self {
            registry,
            enhancement,
            denoise,
            sharpen,
        }
    }

    /// The profile registry backing profile selection.
    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Mutable access for registering ad-hoc profiles before processing.
    pub fn registry_mut(&mut self) -> &mut ProfileRegistry {
        &mut self.registry
    }

    /// Resolve the concrete parameters for one file.
    ///
    /// Profile selection: an explicit key must exist in the registry (a
    /// typo is a hard error); otherwise the make/model metadata is matched
    /// best-effort against registered profiles. With a resolved profile, an
    /// `auto` denoise strength is replaced by the profile's ISO ladder
    /// recommendation; without one it stays `auto` and the denoiser falls
    /// back to content-based estimation.
    pub fn resolve(&self, explicit: Option<&str>, metadata: &Metadata) -> Result<ResolvedParams<'_>> {
        let profile = match explicit {
            Some(key) => Some(self.registry.get(key)?),
            None => {
                if metadata.make.is_some() || metadata.model.is_some() {
                    let make = metadata.make.as_deref().unwrap_or("");
                    let model = metadata.model.as_deref().unwrap_or("");
                    self.registry.detect(make, model).map(|(_, p)| p)
                } else {
                    None
                }
            }
        };

        let mut denoise = self.denoise;
        if denoise.strength == DenoiseStrength::Auto {
            if let (Some(profile), Some(iso)) = (profile, metadata.iso) {
                let recommended = profile.recommended_denoise(iso);
                debug!(iso, %recommended, "Profile denoise recommendation applied");
                denoise = denoise.with_strength(recommended);
            }
        }

        Ok(ResolvedParams { profile, denoise })
    }

    /// Run the full pipeline on one raster.
    ///
    /// Stage order is fixed: corrections (skipped when no profile
    /// resolved), denoise, tone enhancement, sharpening. Output dimensions
    /// and bit depth always match the input.
    #[instrument(skip_all, fields(w = raster.width(), h = raster.height(), depth = ?raster.bit_depth()))]
    pub fn process(
        &self,
        raster: &Raster,
        explicit: Option<&str>,
        metadata: &Metadata,
    ) -> Result<Raster> {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return Err(ReviveError::NumericDegenerate(format!(
                "cannot process a zero-sized raster ({width}x{height})"
            )));
        }

        let params = self.resolve(explicit, metadata)?;

        let corrected = match params.profile {
            Some(profile) => {
                info!(camera = %profile.name, "Applying camera corrections");
                CameraCorrectionEngine::correct(raster, profile)?
            }
            None => {
                debug!("No camera profile resolved; skipping corrections");
                raster.clone()
            }
        };

        let denoised = Denoiser::new(params.denoise).denoise(&corrected);
        let enhanced = ToneEnhancer::new(self.enhancement).enhance(&denoised);
        let sharpened = EdgeAwareSharpener::new(self.sharpen).sharpen(&enhanced);

        info!("Pipeline complete");
        Ok(sharpened)
    }
}

// -- Tests --------------------------------------------------------------------
