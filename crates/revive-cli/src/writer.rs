// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output writers — lossless TIFF/PNG at source depth, lossy JPEG at 8 bits.
// Output files are named `<stem>_revived.<ext>` in the output directory.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use tracing::{info, instrument};

use revive_core::error::{Result, ReviveError};
use revive_core::Raster;

/// Persisted output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Lossless, preserves 16-bit depth.
    Tiff,
    /// Lossless, preserves 16-bit depth.
    Png,
    /// Lossy, always 8-bit.
    Jpeg,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Tiff => "tiff",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Tiff => "tiff",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
        };
        f.write_str(name)
    }
}

/// Output path for `input` in `output_dir`: `<stem>_revived.<ext>`.
pub fn output_path(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    output_dir.join(format!("{stem}_revived.{}", format.extension()))
}

/// Write a raster to disk.
///
/// TIFF and PNG keep the raster's bit depth; JPEG downsamples 16-bit input
/// to 8 bits and encodes at the given quality (1-100).
#[instrument(skip(raster), fields(path = %path.display(), %format, quality))]
pub fn save(raster: Raster, path: &Path, format: OutputFormat, quality: u8) -> Result<()> {
    match format {
        OutputFormat::Tiff => {
            raster
                .into_dynamic()
                .save_with_format(path, ImageFormat::Tiff)
                .map_err(|err| {
                    ReviveError::ImageError(format!("TIFF encoding failed for {}: {}", path.display(), err))
                })?;
        }
        OutputFormat::Png => {
            raster
                .into_dynamic()
                .save_with_format(path, ImageFormat::Png)
                .map_err(|err| {
                    ReviveError::ImageError(format!("PNG encoding failed for {}: {}", path.display(), err))
                })?;
        }
        OutputFormat::Jpeg => {
            let rgb = raster.to_rgb8_lossy();
            let file = std::fs::File::create(path)?;
            let encoder = JpegEncoder::new_with_quality(file, quality.clamp(1, 100));
            rgb.write_with_encoder(encoder).map_err(|err| {
                ReviveError::ImageError(format!("JPEG encoding failed for {}: {}", path.display(), err))
            })?;
        }
    }

    info!("Output written");
    Ok(())
}

// -- Tests --------------------------------------------------------------------
