// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Revive pipeline — camera correction profiles, the correction engine,
// adaptive denoising, tone enhancement, edge-aware sharpening, and the
// orchestrator that sequences them per raster.

pub mod correction;
pub mod denoise;
pub mod enhance;
pub mod pipeline;
pub mod profile;
pub mod registry;
pub mod sharpen;

pub use correction::CameraCorrectionEngine;
pub use denoise::Denoiser;
pub use enhance::ToneEnhancer;
pub use pipeline::{PipelineOrchestrator, ResolvedParams};
pub use profile::{CorrectionProfile, NoisePoint};
pub use registry::ProfileRegistry;
pub use sharpen::EdgeAwareSharpener;
