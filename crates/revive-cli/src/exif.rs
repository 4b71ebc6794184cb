// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EXIF boundary — best-effort capture metadata extraction. Every field is
// optional; a file with no readable EXIF yields empty metadata, never an
// error.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{Field, In, Tag, Value};
use tracing::{debug, instrument};

use revive_core::Metadata;

/// Read capture metadata from a file's EXIF block.
///
/// Extracts ISO, aperture, shutter speed, and the camera make/model. Any
/// field that is missing or malformed is simply left as `None`.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn read_metadata(path: impl AsRef<Path>) -> Metadata {
    let Ok(file) = File::open(path.as_ref()) else {
        return Metadata::default();
    };
    let mut reader = BufReader::new(file);
    let Ok(exif) = exif::Reader::new().read_from_container(&mut reader) else {
        debug!("No readable EXIF block");
        return Metadata::default();
    };

    let metadata = Metadata {
        iso: exif
            .get_field(Tag::PhotographicSensitivity, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0)),
        aperture: exif
            .get_field(Tag::FNumber, In::PRIMARY)
            .and_then(rational_value),
        shutter: exif
            .get_field(Tag::ExposureTime, In::PRIMARY)
            .map(|f| f.display_value().to_string()),
        make: exif.get_field(Tag::Make, In::PRIMARY).and_then(ascii_value),
        model: exif
            .get_field(Tag::Model, In::PRIMARY)
            .and_then(ascii_value),
    };
    debug!(?metadata.iso, ?metadata.make, ?metadata.model, "EXIF metadata read");
    metadata
}

/// First rational of a field as a float (e.g. FNumber 28/10 -> 2.8).
fn rational_value(field: &Field) -> Option<f64> {
    match &field.value {
        Value::Rational(values) => values.first().map(|r| r.to_f64()),
        _ => None,
    }
}

/// First ASCII component of a field as a trimmed string.
fn ascii_value(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(components) => components.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_end_matches('\0')
                .trim()
                .to_string()
        }),
        _ => None,
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    /// A file without EXIF yields empty metadata rather than an error.
    #[test]
    fn exif_absence_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.png");
        let img = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        DynamicImage::ImageRgb8(img).save(&path).unwrap();

        let metadata = read_metadata(&path);
        assert_eq!(metadata, Metadata::default());
    }

    #[test]
    fn missing_file_yields_empty_metadata() {
        let metadata = read_metadata("/nonexistent/photo.jpg");
        assert_eq!(metadata, Metadata::default());
    }
}
