// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding boundary — turns container files (TIFF/PNG/JPEG) into pipeline
// rasters, preserving 16-bit depth where the source has it.

use std::path::Path;

use tracing::{info, instrument};

use revive_core::error::{Result, ReviveError};
use revive_core::Raster;

/// Decode an image file into a raster.
///
/// The source's bit depth is preserved (16-bit TIFF/PNG stays 16-bit) and
/// non-RGB layouts are converted. A decoder failure is a per-file
/// [`ReviveError::DecodeFailure`]; the batch driver reports it and moves on.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn decode_raster(path: impl AsRef<Path>) -> Result<Raster> {
    let image = image::open(path.as_ref()).map_err(|err| {
        ReviveError::DecodeFailure(format!("{}: {}", path.as_ref().display(), err))
    })?;

    let raster = Raster::from_dynamic(image)?;
    info!(
        width = raster.width(),
        height = raster.height(),
        depth = ?raster.bit_depth(),
        "Image decoded"
    );
    Ok(raster)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use revive_core::{BitDepth, Rgb16Image};

    #[test]
    fn decodes_8bit_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        let img = RgbImage::from_pixel(6, 4, Rgb([10, 20, 30]));
        DynamicImage::ImageRgb8(img).save(&path).unwrap();

        let raster = decode_raster(&path).unwrap();
        assert_eq!(raster.bit_depth(), BitDepth::Eight);
        assert_eq!(raster.dimensions(), (6, 4));
    }

    #[test]
    fn preserves_16bit_depth_from_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep.png");
        let img = Rgb16Image::from_pixel(3, 3, Rgb([40000u16, 2000, 60000]));
        DynamicImage::ImageRgb16(img).save(&path).unwrap();

        let raster = decode_raster(&path).unwrap();
        assert_eq!(raster.bit_depth(), BitDepth::Sixteen);
    }

    #[test]
    fn garbage_input_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.png");
        std::fs::write(&path, b"definitely not pixels").unwrap();

        let err = decode_raster(&path).unwrap_err();
        assert!(matches!(err, ReviveError::DecodeFailure(_)));
    }

    #[test]
    fn missing_file_is_a_decode_failure() {
        let err = decode_raster("/nonexistent/path/img.png").unwrap_err();
        assert!(matches!(err, ReviveError::DecodeFailure(_)));
    }
}
