// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tone enhancer — exposure, shadow lift, highlight compression, contrast,
// saturation, and a subtle midtone S-curve, applied in normalized [0, 1]
// floats. Every parameter at its identity value makes the corresponding
// step an exact no-op.

use std::f32::consts::PI;

use tracing::{debug, instrument};

use revive_core::{EnhancementConfig, NormalizedImage, Raster};

/// Amplitude of the additive midtone S-curve.
const CURVE_INTENSITY: f32 = 0.05;

/// Tone and color enhancement stage.
pub struct ToneEnhancer {
    config: EnhancementConfig,
}

impl ToneEnhancer {
    pub fn new(config: EnhancementConfig) -> Self {
        Self { config }
    }

    /// Enhance a raster. Output has identical dimensions and bit depth.
    ///
    /// Step order: exposure, shadow lift, highlight compression, contrast,
    /// saturation, tone curve. Each step is skipped outright at its
    /// identity parameter, and the result is clipped to [0, 1] before
    /// re-quantization.
    #[instrument(skip_all, fields(contrast = self.config.contrast, exposure = self.config.exposure))]
    pub fn enhance(&self, raster: &Raster) -> Raster {
        let cfg = &self.config;
        let depth = raster.bit_depth();
        let mut img = raster.to_normalized();

        if cfg.exposure != 0.0 {
            let gain = 2.0f32.powf(cfg.exposure);
            for v in &mut img.data {
                *v *= gain;
            }
        }

        if cfg.shadows != 0.0 {
            // Quadratic falloff: strongest near black, fading by midtones.
            for v in &mut img.data {
                *v += cfg.shadows * 0.1 * (1.0 - *v).powi(2);
            }
        }

        if cfg.highlights != 0.0 {
            // Soft-knee roll-off of bright values.
            let exponent = 1.0 + 0.5 * cfg.highlights;
            for v in &mut img.data {
                *v = 1.0 - (1.0 - v.clamp(0.0, 1.0)).powf(exponent);
            }
        }

        if cfg.contrast != 1.0 {
            for v in &mut img.data {
                *v = (*v - 0.5) * cfg.contrast + 0.5;
            }
        }

        if cfg.saturation != 1.0 {
            apply_saturation(&mut img, cfg.saturation);
        }

        if cfg.curve {
            // Additive S-curve; fixes 0 and 1, lifts above and dips below
            // the midpoint symmetrically.
            for v in &mut img.data {
                *v += CURVE_INTENSITY * (PI * v.clamp(0.0, 1.0)).sin();
            }
        }

        img.clamp_unit();
        debug!("Tone enhancement applied");
        Raster::from_normalized(&img, depth)
    }
}

// -- Saturation ----------------------------------------------------------------

/// Scale saturation in HSV space. Channel values are clamped to [0, 1]
/// before conversion; hue and value are untouched.
fn apply_saturation(img: &mut NormalizedImage, factor: f32) {
    for pixel in img.data.chunks_exact_mut(3) {
        let r = pixel[0].clamp(0.0, 1.0);
        let g = pixel[1].clamp(0.0, 1.0);
        let b = pixel[2].clamp(0.0, 1.0);

        let (h, s, v) = rgb_to_hsv(r, g, b);
        let (r, g, b) = hsv_to_rgb(h, (s * factor).clamp(0.0, 1.0), v);
        pixel[0] = r;
        pixel[1] = g;
        pixel[2] = b;
    }
}

/// RGB in [0, 1] to (hue in degrees [0, 360), saturation, value).
fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    (hue, saturation, max)
}

/// Inverse of [`rgb_to_hsv`].
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (r + m, g + m, b + m)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn textured_raster() -> Raster {
        Raster::Rgb8(RgbImage::from_fn(16, 16, |x, y| {
            Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        }))
    }

    /// Identity parameters make the enhancer an exact no-op.
    #[test]
    fn identity_config_is_identity() {
        let raster = textured_raster();
        let enhancer = ToneEnhancer::new(EnhancementConfig::identity());
        assert_eq!(enhancer.enhance(&raster), raster);
    }

    #[test]
    fn positive_exposure_brightens() {
        let raster = Raster::Rgb8(RgbImage::from_pixel(8, 8, Rgb([100, 100, 100])));
        let enhancer = ToneEnhancer::new(EnhancementConfig {
            exposure: 1.0,
            ..EnhancementConfig::identity()
        });
        let Raster::Rgb8(out) = enhancer.enhance(&raster) else {
            panic!()
        };
        // One stop doubles: 100/255 * 2 -> 200.
        assert_eq!(out.get_pixel(4, 4).0, [200, 200, 200]);
    }

    /// Shadow lift raises near-black pixels far more than midtones, and
    /// leaves white alone.
    #[test]
    fn shadow_lift_targets_shadows() {
        let mut img = RgbImage::from_pixel(3, 1, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([128, 128, 128]));
        img.put_pixel(2, 0, Rgb([255, 255, 255]));
        let enhancer = ToneEnhancer::new(EnhancementConfig {
            shadows: 1.0,
            ..EnhancementConfig::identity()
        });

        let Raster::Rgb8(out) = enhancer.enhance(&Raster::Rgb8(img)) else {
            panic!()
        };
        let black_lift = out.get_pixel(0, 0).0[0];
        let mid_lift = out.get_pixel(1, 0).0[0] as i32 - 128;
        assert_eq!(black_lift, 26); // 0.1 * (1-0)^2 * 255
        assert!(mid_lift < black_lift as i32 && mid_lift > 0);
        assert_eq!(out.get_pixel(2, 0).0[0], 255);
    }

    /// Highlight compression squeezes bright values toward white while
    /// fixing both endpoints, flattening highlight contrast.
    #[test]
    fn highlight_compression_flattens_brights() {
        let mut img = RgbImage::from_pixel(3, 1, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([230, 230, 230]));
        img.put_pixel(2, 0, Rgb([255, 255, 255]));
        let enhancer = ToneEnhancer::new(EnhancementConfig {
            highlights: 1.0,
            ..EnhancementConfig::identity()
        });

        let Raster::Rgb8(out) = enhancer.enhance(&Raster::Rgb8(img)) else {
            panic!()
        };
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        // The gap between 230 and white shrinks: 1 - (1 - v)^1.5 > v.
        let bright = out.get_pixel(1, 0).0[0];
        assert!(bright > 230 && bright < 255, "bright = {bright}");
        assert_eq!(out.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn contrast_expands_around_midpoint() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([64, 64, 64]));
        img.put_pixel(1, 0, Rgb([192, 192, 192]));
        let enhancer = ToneEnhancer::new(EnhancementConfig {
            contrast: 1.5,
            ..EnhancementConfig::identity()
        });

        let Raster::Rgb8(out) = enhancer.enhance(&Raster::Rgb8(img)) else {
            panic!()
        };
        assert!(out.get_pixel(0, 0).0[0] < 64);
        assert!(out.get_pixel(1, 0).0[0] > 192);
    }

    /// Saturation boost moves channels apart; desaturation to zero produces
    /// gray. Pure grays are unaffected either way.
    #[test]
    fn saturation_scales_chroma() {
        let raster = Raster::Rgb8(RgbImage::from_pixel(4, 4, Rgb([180, 120, 60])));

        let boosted = ToneEnhancer::new(EnhancementConfig {
            saturation: 1.5,
            ..EnhancementConfig::identity()
        })
        .enhance(&raster);
        let Raster::Rgb8(boosted) = boosted else { panic!() };
        let p = boosted.get_pixel(0, 0).0;
        assert!(p[0] as i32 - p[2] as i32 > 120);

        let grayed = ToneEnhancer::new(EnhancementConfig {
            saturation: 0.0,
            ..EnhancementConfig::identity()
        })
        .enhance(&raster);
        let Raster::Rgb8(grayed) = grayed else { panic!() };
        let p = grayed.get_pixel(0, 0).0;
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);

        let gray = Raster::Rgb8(RgbImage::from_pixel(2, 2, Rgb([90, 90, 90])));
        let out = ToneEnhancer::new(EnhancementConfig {
            saturation: 2.0,
            ..EnhancementConfig::identity()
        })
        .enhance(&gray);
        assert_eq!(out, gray);
    }

    /// The S-curve fixes 0 and 1 and brightens values just above midpoint.
    #[test]
    fn tone_curve_fixes_endpoints() {
        let mut img = RgbImage::from_pixel(3, 1, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([80, 80, 80]));
        img.put_pixel(2, 0, Rgb([255, 255, 255]));
        let enhancer = ToneEnhancer::new(EnhancementConfig {
            curve: true,
            ..EnhancementConfig::identity()
        });

        let Raster::Rgb8(out) = enhancer.enhance(&Raster::Rgb8(img)) else {
            panic!()
        };
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(2, 0).0[0], 255);
        assert!(out.get_pixel(1, 0).0[0] > 80);
    }

    /// HSV round trip at representative colors.
    #[test]
    fn hsv_round_trip() {
        let cases = [
            (0.0, 0.0, 0.0),
            (1.0, 1.0, 1.0),
            (0.5, 0.25, 0.75),
            (0.9, 0.1, 0.1),
            (0.1, 0.9, 0.2),
            (0.2, 0.3, 0.9),
        ];
        for (r, g, b) in cases {
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let (r2, g2, b2) = hsv_to_rgb(h, s, v);
            assert!(
                (r - r2).abs() < 1e-5 && (g - g2).abs() < 1e-5 && (b - b2).abs() < 1e-5,
                "round trip failed for ({r}, {g}, {b})"
            );
        }
    }

    /// Default settings keep every output value in range on extreme inputs.
    #[test]
    fn defaults_stay_in_range() {
        let mut img = RgbImage::from_pixel(4, 1, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 255, 255]));
        img.put_pixel(2, 0, Rgb([255, 0, 0]));
        img.put_pixel(3, 0, Rgb([0, 255, 128]));

        let enhancer = ToneEnhancer::new(EnhancementConfig {
            exposure: 2.0,
            shadows: 1.0,
            highlights: 1.0,
            contrast: 2.0,
            saturation: 3.0,
            curve: true,
        });
        // No assertion beyond completing without wrap: from_normalized
        // clamps, so u8 conversion cannot overflow.
        let Raster::Rgb8(out) = enhancer.enhance(&Raster::Rgb8(img)) else {
            panic!()
        };
        assert_eq!(out.dimensions(), (4, 1));
    }
}
