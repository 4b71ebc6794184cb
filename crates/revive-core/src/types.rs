// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster types shared across the pipeline. A `Raster` is an in-memory RGB
// image at a declared bit depth; all stages preserve its shape and depth and
// perform their arithmetic on a normalized floating-point view.

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{ReviveError, Result};

/// A 16-bit-per-channel RGB image buffer.
pub type Rgb16Image = ImageBuffer<Rgb<u16>, Vec<u16>>;

/// Bits per channel of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitDepth {
    /// 8 bits per channel (0..=255).
    Eight,
    /// 16 bits per channel (0..=65535).
    Sixteen,
}

impl BitDepth {
    /// Maximum representable channel value at this depth.
    pub fn max_value(self) -> f32 {
        match self {
            BitDepth::Eight => 255.0,
            BitDepth::Sixteen => 65535.0,
        }
    }
}

/// An in-memory RGB raster at 8 or 16 bits per channel.
///
/// Every pipeline stage maps `Raster -> Raster` preserving dimensions and
/// depth. Internal computation happens in normalized [0, 1] floats (see
/// [`NormalizedImage`]) and is re-quantized with clamping at stage
/// boundaries, so channel values never wrap or overflow.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Rgb8(RgbImage),
    Rgb16(Rgb16Image),
}

impl Raster {
    // -- Construction ---------------------------------------------------------

    /// Wrap a decoded `DynamicImage`, converting non-RGB layouts (grayscale,
    /// alpha) to the nearest RGB representation at the source bit depth.
    ///
    /// Fails with [`ReviveError::NumericDegenerate`] on a zero-sized image;
    /// a raster with no pixels cannot flow through the correction stages.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ReviveError::NumericDegenerate(format!(
                "zero-sized image ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let raster = match &image {
            DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb32F(_)
            | DynamicImage::ImageRgba32F(_) => Raster::Rgb16(image.to_rgb16()),
            _ => Raster::Rgb8(image.to_rgb8()),
        };
        Ok(raster)
    }

    // -- Accessors ------------------------------------------------------------

    /// Raster width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            Raster::Rgb8(img) => img.width(),
            Raster::Rgb16(img) => img.width(),
        }
    }

    /// Raster height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Raster::Rgb8(img) => img.height(),
            Raster::Rgb16(img) => img.height(),
        }
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Declared bits per channel.
    pub fn bit_depth(&self) -> BitDepth {
        match self {
            Raster::Rgb8(_) => BitDepth::Eight,
            Raster::Rgb16(_) => BitDepth::Sixteen,
        }
    }

    /// Maximum channel value for this raster's depth (255.0 or 65535.0).
    pub fn max_value(&self) -> f32 {
        self.bit_depth().max_value()
    }

    // -- Conversion -----------------------------------------------------------

    /// Expand into interleaved RGB floats normalized to [0, 1].
    pub fn to_normalized(&self) -> NormalizedImage {
        let (width, height) = self.dimensions();
        let data = match self {
            Raster::Rgb8(img) => img.as_raw().iter().map(|&v| v as f32 / 255.0).collect(),
            Raster::Rgb16(img) => img.as_raw().iter().map(|&v| v as f32 / 65535.0).collect(),
        };
        NormalizedImage {
            width,
            height,
            data,
        }
    }

    /// Re-quantize a normalized float image at the given depth.
    ///
    /// Values are clamped to [0, 1] before scaling, so out-of-range floats
    /// (including the products of aggressive corrections) saturate instead
    /// of wrapping.
    pub fn from_normalized(norm: &NormalizedImage, depth: BitDepth) -> Self {
        match depth {
            BitDepth::Eight => {
                let raw: Vec<u8> = norm
                    .data
                    .iter()
                    .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
                    .collect();
                Raster::Rgb8(
                    RgbImage::from_raw(norm.width, norm.height, raw)
                        .expect("normalized buffer length matches dimensions"),
                )
            }
            BitDepth::Sixteen => {
                let raw: Vec<u16> = norm
                    .data
                    .iter()
                    .map(|&v| (v.clamp(0.0, 1.0) * 65535.0).round() as u16)
                    .collect();
                Raster::Rgb16(
                    Rgb16Image::from_raw(norm.width, norm.height, raw)
                        .expect("normalized buffer length matches dimensions"),
                )
            }
        }
    }

    /// Downscale to an 8-bit view (16-bit rasters drop the low byte).
    ///
    /// Used by stages whose kernels are calibrated on 8-bit statistics.
    pub fn to_rgb8_lossy(&self) -> RgbImage {
        match self {
            Raster::Rgb8(img) => img.clone(),
            Raster::Rgb16(img) => {
                let raw: Vec<u8> = img.as_raw().iter().map(|&v| (v >> 8) as u8).collect();
                RgbImage::from_raw(img.width(), img.height(), raw)
                    .expect("raw buffer length matches dimensions")
            }
        }
    }

    /// Convert into a `DynamicImage` for encoding by the writers.
    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Raster::Rgb8(img) => DynamicImage::ImageRgb8(img),
            Raster::Rgb16(img) => DynamicImage::ImageRgb16(img),
        }
    }
}

/// Interleaved RGB floats in [0, 1], the working representation inside every
/// pipeline stage.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major interleaved RGB, length `width * height * 3`.
    pub data: Vec<f32>,
}

impl NormalizedImage {
    /// Index of channel `c` of pixel `(x, y)` into `data`.
    #[inline]
    pub fn index(&self, x: u32, y: u32, c: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * 3 + c
    }

    /// Channel value at `(x, y, c)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32, c: usize) -> f32 {
        self.data[self.index(x, y, c)]
    }

    /// Set channel value at `(x, y, c)`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, c: usize, value: f32) {
        let idx = self.index(x, y, c);
        self.data[idx] = value;
    }

    /// Clamp every channel to [0, 1] in place.
    pub fn clamp_unit(&mut self) {
        for v in &mut self.data {
            *v = v.clamp(0.0, 1.0);
        }
    }
}

/// Per-file capture metadata read once from EXIF and used only to
/// parametrize the pipeline (profile auto-detection, auto-denoise strength).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// ISO sensitivity (EXIF PhotographicSensitivity).
    pub iso: Option<u32>,
    /// Aperture as an f-number.
    pub aperture: Option<f64>,
    /// Shutter speed, kept as the EXIF display string (e.g. "1/250").
    pub shutter: Option<String>,
    /// Camera manufacturer string.
    pub make: Option<String>,
    /// Camera model string.
    pub model: Option<String>,
}

// -- Tests --------------------------------------------------------------------
