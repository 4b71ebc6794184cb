// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Camera correction engine — applies a profile's optical and color
// corrections to a raster in a fixed order: radial distortion, gradient
// color cast, vignette, shadow color cast, chromatic aberration. Each
// sub-stage is a no-op when its coefficient is (near-)zero.

use image::{ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, instrument};

use revive_core::error::{Result, ReviveError};
use revive_core::{NormalizedImage, Raster};

use crate::profile::CorrectionProfile;

/// Distortion coefficients smaller than this are treated as zero.
const DISTORTION_EPSILON: f32 = 1e-4;

/// Applies camera-specific optical and color corrections.
///
/// All arithmetic happens on a normalized [0, 1] float view; the output is
/// re-quantized to the input's bit depth with clamping, so corrections can
/// never wrap channel values.
pub struct CameraCorrectionEngine;

impl CameraCorrectionEngine {
    /// Correct `raster` according to `profile`. Output has identical
    /// dimensions and bit depth.
    ///
    /// Sub-stage order matters: later corrections operate on the already
    /// geometrically corrected image.
    #[instrument(skip_all, fields(camera = %profile.name, w = raster.width(), h = raster.height()))]
    pub fn correct(raster: &Raster, profile: &CorrectionProfile) -> Result<Raster> {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return Err(ReviveError::NumericDegenerate(format!(
                "cannot correct a zero-sized raster ({width}x{height})"
            )));
        }

        let depth = raster.bit_depth();
        let mut img = raster.to_normalized();

        img = correct_distortion(img, profile.distortion_k1);
        correct_gradient_cast(&mut img, profile.gradient_cast_strength);
        correct_vignette(&mut img, profile.vignette_strength);
        correct_color_cast(&mut img, profile.shadow_warmth, profile.green_blue_shift);
        reduce_chromatic_aberration(&mut img, profile.chromatic_aberration);

        img.clamp_unit();
        debug!("Camera corrections applied");
        Ok(Raster::from_normalized(&img, depth))
    }
}

// -- Radial distortion ---------------------------------------------------------

/// Undo barrel/pincushion distortion with a single radial coefficient `k1`
/// (negative = barrel).
///
/// Inverse mapping: each output pixel at normalized radius `r` from the
/// principal point (the image center, with focal-length proxy
/// `f = max(width, height)`) samples the source at the radially displaced
/// position `center + offset * (1 + k1 * r^2)`, bilinearly interpolated.
fn correct_distortion(img: NormalizedImage, k1: f32) -> NormalizedImage {
    if k1.abs() < DISTORTION_EPSILON {
        return img;
    }

    let (width, height) = (img.width, img.height);
    let focal = width.max(height) as f32;
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    let mut out = NormalizedImage {
        width,
        height,
        data: vec![0.0; img.data.len()],
    };

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let r2 = (dx / focal).powi(2) + (dy / focal).powi(2);
            let scale = 1.0 + k1 * r2;
            let src_x = cx + dx * scale;
            let src_y = cy + dy * scale;
            for c in 0..3 {
                out.set(x, y, c, sample_bilinear(&img, src_x, src_y, c));
            }
        }
    }
    out
}

/// Bilinear sample of channel `c` at a fractional position, with source
/// coordinates clamped to the image border.
fn sample_bilinear(img: &NormalizedImage, x: f32, y: f32, c: usize) -> f32 {
    let max_x = (img.width - 1) as f32;
    let max_y = (img.height - 1) as f32;
    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(img.width - 1);
    let y1 = (y0 + 1).min(img.height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let top = img.get(x0, y0, c) * (1.0 - fx) + img.get(x1, y0, c) * fx;
    let bottom = img.get(x0, y1, c) * (1.0 - fx) + img.get(x1, y1, c) * fx;
    top * (1.0 - fy) + bottom * fy
}

// -- Gradient color cast -------------------------------------------------------

/// Correct a horizontal cyan-red ("two-tone") shift across the frame.
///
/// The correction ramps linearly from -1 at the left edge to +1 at the
/// right, adds `+strength` to blue and `-strength` to red, and is attenuated
/// by the midtone mask `4 * L * (1 - L)` so it vanishes at black and white.
fn correct_gradient_cast(img: &mut NormalizedImage, strength: f32) {
    if strength == 0.0 {
        return;
    }

    let (width, height) = (img.width, img.height);
    for y in 0..height {
        for x in 0..width {
            let gradient = if width > 1 {
                2.0 * x as f32 / (width - 1) as f32 - 1.0
            } else {
                0.0
            };
            let r = img.get(x, y, 0);
            let g = img.get(x, y, 1);
            let b = img.get(x, y, 2);
            let mean = (r + g + b) / 3.0;
            let midtone = 4.0 * mean * (1.0 - mean);

            let shift = gradient * strength * midtone;
            img.set(x, y, 0, (r - shift).clamp(0.0, 1.0));
            img.set(x, y, 2, (b + shift).clamp(0.0, 1.0));
        }
    }
}

// -- Vignette ------------------------------------------------------------------

/// Brighten toward the corners: `output = input * (1 + strength * d^2)`,
/// where `d` is the distance from the image center normalized so the
/// farthest corner sits at 1.
fn correct_vignette(img: &mut NormalizedImage, strength: f32) {
    if strength == 0.0 {
        return;
    }

    let (width, height) = (img.width, img.height);
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt();

    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let d = (dx * dx + dy * dy).sqrt() / max_dist;
            let gain = 1.0 + strength * d * d;
            for c in 0..3 {
                let v = img.get(x, y, c) * gain;
                img.set(x, y, c, v.clamp(0.0, 1.0));
            }
        }
    }
}

// -- Shadow color cast ---------------------------------------------------------

/// Correct per-channel color tendencies.
///
/// A shadow mask `clip(1 - 2L, 0, 1)` (L = Rec.601 luminance) scales a red
/// shift in dark regions; separately, wherever green dominates both other
/// channels, blue is reduced proportionally to green.
fn correct_color_cast(img: &mut NormalizedImage, shadow_warmth: f32, green_blue_shift: f32) {
    if shadow_warmth == 0.0 && green_blue_shift == 0.0 {
        return;
    }

    let (width, height) = (img.width, img.height);
    for y in 0..height {
        for x in 0..width {
            let r = img.get(x, y, 0);
            let g = img.get(x, y, 1);
            let b = img.get(x, y, 2);

            let luminance = 0.299 * r + 0.587 * g + 0.114 * b;
            let shadow_mask = (1.0 - 2.0 * luminance).clamp(0.0, 1.0);
            let r = (r + shadow_mask * shadow_warmth).clamp(0.0, 1.0);
            img.set(x, y, 0, r);

            if g > b && g > r {
                img.set(x, y, 2, (b - green_blue_shift * g).clamp(0.0, 1.0));
            }
        }
    }
}

// -- Chromatic aberration ------------------------------------------------------

/// Reduce color fringing in the extreme corners.
///
/// A corner mask ramps from 0 at normalized radius 0.7 to 1 at radius 1.0,
/// scaled by `strength`; where it is non-zero the red and blue channels are
/// blended toward a slightly blurred version of themselves. Green and the
/// image center are untouched. Skips entirely if the mask never exceeds 1%.
fn reduce_chromatic_aberration(img: &mut NormalizedImage, strength: f32) {
    if strength == 0.0 {
        return;
    }

    let (width, height) = (img.width, img.height);
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let max_dist = (cx * cx + cy * cy).sqrt();

    let mask: Vec<f32> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let d = (dx * dx + dy * dy).sqrt() / max_dist;
            ((d - 0.7) / 0.3).clamp(0.0, 1.0) * strength
        })
        .collect();

    let mask_max = mask.iter().fold(0.0f32, |a, &b| a.max(b));
    if mask_max < 0.01 {
        return;
    }

    let red_blur = blur_plane(img, 0, 0.5);
    let blue_blur = blur_plane(img, 2, 0.5);

    for y in 0..height {
        for x in 0..width {
            let m = mask[(y * width + x) as usize];
            if m <= 0.0 {
                continue;
            }
            let idx = (y * width + x) as usize;
            let r = img.get(x, y, 0);
            let b = img.get(x, y, 2);
            img.set(x, y, 0, r * (1.0 - m) + red_blur[idx] * m);
            img.set(x, y, 2, b * (1.0 - m) + blue_blur[idx] * m);
        }
    }
}

/// Gaussian-blur a single channel of a normalized image, returning the
/// blurred plane as a flat row-major buffer.
fn blur_plane(img: &NormalizedImage, c: usize, sigma: f32) -> Vec<f32> {
    let plane: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(img.width, img.height, |x, y| Luma([img.get(x, y, c)]));
    gaussian_blur_f32(&plane, sigma).into_raw()
}

// -- Tests --------------------------------------------------------------------
