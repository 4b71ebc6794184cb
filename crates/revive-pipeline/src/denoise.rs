// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive denoiser — non-local means over RGB patches with an optional
// edge-aware blend, plus a robust content-based noise estimator for "auto"
// strength. The filter kernel is calibrated on 8-bit statistics, so 16-bit
// rasters round-trip through an 8-bit pass and get their fine texture
// restored from the original's high-frequency residual.

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, laplacian_filter};
use imageproc::morphology::dilate;
use tracing::{debug, instrument};

use revive_core::{DenoiseConfig, DenoiseStrength, Raster, Rgb16Image};

/// Scale factor of the median absolute deviation of a Laplacian-filtered
/// image to the Gaussian noise sigma.
const MAD_TO_SIGMA: f64 = 0.6745;

/// Weight of the original high-frequency residual added back after a
/// 16-bit raster's 8-bit denoise round trip.
const DETAIL_RESTORE_WEIGHT: f32 = 0.3;

/// Edge-preserving image denoiser.
///
/// Strength categories map to fixed filter parameters; `auto` estimates the
/// noise level from the image content. With `preserve_detail` on, a lighter
/// pass is blended in along detected edges so fine structure survives.
pub struct Denoiser {
    config: DenoiseConfig,
}

impl Denoiser {
    pub fn new(config: DenoiseConfig) -> Self {
        Self { config }
    }

    /// Denoise a raster. Output has identical dimensions and bit depth;
    /// `off` (or an estimated strength of zero) returns the input unchanged.
    #[instrument(skip_all, fields(strength = %self.config.strength, preserve = self.config.preserve_detail))]
    pub fn denoise(&self, raster: &Raster) -> Raster {
        if self.config.strength == DenoiseStrength::Off {
            return raster.clone();
        }

        // The filter operates on 8-bit statistics regardless of source depth.
        let image8 = raster.to_rgb8_lossy();

        let h = match self.config.strength.filter_strength() {
            Some(h) => h,
            None => estimate_noise_strength(&image8),
        };
        if h == 0 {
            return raster.clone();
        }
        debug!(h, "Denoise filter strength resolved");

        let denoised8 = if self.config.preserve_detail {
            denoise_edge_aware(&image8, h)
        } else {
            nl_means(&image8, h, 3, 10)
        };

        match raster {
            Raster::Rgb8(_) => Raster::Rgb8(denoised8),
            Raster::Rgb16(original) => Raster::Rgb16(restore_detail_16bit(original, &denoised8)),
        }
    }
}

// -- Noise estimation ----------------------------------------------------------

/// Estimate the noise level of an image and map it to a filter strength.
///
/// Robust sigma estimate: median absolute value of the Laplacian response
/// of the grayscale projection, divided by 0.6745.
fn estimate_noise_strength(image: &RgbImage) -> u8 {
    let gray = luma_rec601(image);
    let response = laplacian_filter(&gray);

    let mut magnitudes: Vec<f64> = response
        .as_raw()
        .iter()
        .map(|&v| (v as f64).abs())
        .collect();
    if magnitudes.is_empty() {
        return 0;
    }
    magnitudes.sort_unstable_by(|a, b| a.total_cmp(b));
    let median = magnitudes[magnitudes.len() / 2];
    let sigma = median / MAD_TO_SIGMA;
    debug!(sigma, "Estimated noise sigma");

    if sigma < 5.0 {
        2
    } else if sigma < 10.0 {
        4
    } else if sigma < 20.0 {
        7
    } else {
        10
    }
}

/// Rec.601 grayscale projection of an RGB image.
pub(crate) fn luma_rec601(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

// -- Edge-aware blend ----------------------------------------------------------

/// Two-pass edge-aware denoise.
///
/// Runs a full-strength pass and a half-strength pass with tighter windows,
/// then blends per pixel with a soft edge mask: full strength away from
/// edges, the light pass on and near them.
fn denoise_edge_aware(image: &RgbImage, h: u8) -> RgbImage {
    let (width, height) = image.dimensions();

    let gray = luma_rec601(image);
    let edges = canny(&gray, 50.0, 150.0);
    let dilated = dilate(&edges, Norm::LInf, 1);

    let edge_f32: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| {
            Luma([dilated.get_pixel(x, y).0[0] as f32])
        });
    let soft = gaussian_blur_f32(&edge_f32, 2.0);
    let peak = soft.as_raw().iter().fold(0.0f32, |a, &b| a.max(b)).max(1.0);

    let strong = nl_means(image, h, 3, 10);
    let light = nl_means(image, (h / 2).max(2), 2, 7);

    RgbImage::from_fn(width, height, |x, y| {
        let m = soft.get_pixel(x, y).0[0] / peak;
        let s = strong.get_pixel(x, y).0;
        let l = light.get_pixel(x, y).0;
        let blend = |c: usize| -> u8 {
            let v = s[c] as f32 * (1.0 - m) + l[c] as f32 * m;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb([blend(0), blend(1), blend(2)])
    })
}

// -- Non-local means -----------------------------------------------------------

/// Non-local means over RGB patches with a joint-channel distance.
///
/// For every search offset, patch distances for all pixels are derived from
/// an integral image of per-pixel squared differences, so the cost per
/// offset is linear in the image size. The weight kernel is
/// `exp(-max(d^2 - 2*sigma^2, 0) / h^2)` with `sigma = h / 2`, which leaves
/// differences explainable by noise alone at full weight.
fn nl_means(image: &RgbImage, h: u8, template_radius: usize, search_radius: usize) -> RgbImage {
    let (width, height) = image.dimensions();
    let (w, h_px) = (width as usize, height as usize);
    let pad = template_radius + search_radius;
    let (pw, ph) = (w + 2 * pad, h_px + 2 * pad);

    // Mirror-padded interleaved RGB floats in 8-bit units.
    let mut padded = vec![0.0f32; pw * ph * 3];
    for py in 0..ph {
        let sy = reflect_index(py as i64 - pad as i64, h_px as i64);
        for px in 0..pw {
            let sx = reflect_index(px as i64 - pad as i64, w as i64);
            let pixel = image.get_pixel(sx as u32, sy as u32).0;
            let base = (py * pw + px) * 3;
            padded[base] = pixel[0] as f32;
            padded[base + 1] = pixel[1] as f32;
            padded[base + 2] = pixel[2] as f32;
        }
    }

    let h_param = h as f32;
    let sigma2 = (h_param / 2.0).powi(2);
    let inv_h2 = 1.0 / (h_param * h_param);
    let patch_samples = (3 * (2 * template_radius + 1).pow(2)) as f64;

    let mut weighted = vec![0.0f32; w * h_px * 3];
    let mut weight_sum = vec![0.0f32; w * h_px];
    let stride = pw + 1;
    let mut integral = vec![0.0f64; stride * (ph + 1)];

    let s = search_radius as i64;
    for dy in -s..=s {
        for dx in -s..=s {
            // Integral image of squared differences against the shifted copy.
            for py in 0..ph {
                let qy = py as i64 + dy;
                let mut row_sum = 0.0f64;
                for px in 0..pw {
                    let qx = px as i64 + dx;
                    let d2 = if qy >= 0 && qy < ph as i64 && qx >= 0 && qx < pw as i64 {
                        let a = (py * pw + px) * 3;
                        let b = (qy as usize * pw + qx as usize) * 3;
                        let dr = padded[a] - padded[b];
                        let dg = padded[a + 1] - padded[b + 1];
                        let db = padded[a + 2] - padded[b + 2];
                        (dr * dr + dg * dg + db * db) as f64
                    } else {
                        0.0
                    };
                    row_sum += d2;
                    integral[(py + 1) * stride + px + 1] = row_sum + integral[py * stride + px + 1];
                }
            }

            // Accumulate weights for every pixel at this offset.
            for y in 0..h_px {
                let cy = y + pad;
                let y0 = cy - template_radius;
                let y1 = cy + template_radius + 1;
                for x in 0..w {
                    let cx = x + pad;
                    let x0 = cx - template_radius;
                    let x1 = cx + template_radius + 1;

                    let sum = integral[y1 * stride + x1] - integral[y0 * stride + x1]
                        - integral[y1 * stride + x0]
                        + integral[y0 * stride + x0];
                    let d2_mean = (sum / patch_samples) as f32;

                    let excess = (d2_mean - 2.0 * sigma2).max(0.0);
                    let weight = (-excess * inv_h2).exp();

                    let src = ((cy as i64 + dy) as usize * pw + (cx as i64 + dx) as usize) * 3;
                    let dst = (y * w + x) * 3;
                    weighted[dst] += weight * padded[src];
                    weighted[dst + 1] += weight * padded[src + 1];
                    weighted[dst + 2] += weight * padded[src + 2];
                    weight_sum[y * w + x] += weight;
                }
            }
        }
    }

    RgbImage::from_fn(width, height, |x, y| {
        let idx = (y as usize * w + x as usize) * 3;
        let norm = weight_sum[y as usize * w + x as usize];
        let channel = |c: usize| -> u8 {
            (weighted[idx + c] / norm).round().clamp(0.0, 255.0) as u8
        };
        Rgb([channel(0), channel(1), channel(2)])
    })
}

/// Mirror-reflect an index into `[0, n)` without repeating the border
/// sample.
fn reflect_index(mut i: i64, n: i64) -> usize {
    if n == 1 {
        return 0;
    }
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

// -- 16-bit detail restoration -------------------------------------------------

/// Upscale an 8-bit denoise result back to 16 bits and re-inject 30% of the
/// original's high-frequency residual (original minus a mild blur of
/// itself). The residual carries texture, not the noise the filter removed.
fn restore_detail_16bit(original: &Rgb16Image, denoised8: &RgbImage) -> Rgb16Image {
    let (width, height) = original.dimensions();

    let original_f32: ImageBuffer<Rgb<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| {
            let p = original.get_pixel(x, y).0;
            Rgb([p[0] as f32, p[1] as f32, p[2] as f32])
        });
    let blurred = gaussian_blur_f32(&original_f32, 0.5);

    Rgb16Image::from_fn(width, height, |x, y| {
        let den = denoised8.get_pixel(x, y).0;
        let orig = original_f32.get_pixel(x, y).0;
        let blur = blurred.get_pixel(x, y).0;
        let channel = |c: usize| -> u16 {
            let base = den[c] as f32 * 256.0;
            let detail = orig[c] - blur[c];
            (base + detail * DETAIL_RESTORE_WEIGHT)
                .round()
                .clamp(0.0, 65535.0) as u16
        };
        Rgb([channel(0), channel(1), channel(2)])
    })
}

// -- Tests --------------------------------------------------------------------
