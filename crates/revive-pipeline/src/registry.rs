// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Profile registry — maps stable string identifiers to correction profiles
// and performs best-effort auto-detection from EXIF make/model strings.

use std::path::Path;

use tracing::{debug, instrument};

use revive_core::error::{Result, ReviveError};

use crate::profile::CorrectionProfile;

/// Registration-ordered mapping from camera identifier to profile.
///
/// Registration order matters: `detect` returns the first matching profile,
/// and `keys` lists identifiers in the order they were registered.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    entries: Vec<(String, CorrectionProfile)>,
}

impl ProfileRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in profiles.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("sony_rx1r", CorrectionProfile::sony_rx1r());
        registry
    }

    /// Register a profile under `key`, replacing any existing entry with the
    /// same key (its position in the registration order is kept).
    pub fn register(&mut self, key: impl Into<String>, profile: CorrectionProfile) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = profile;
        } else {
            self.entries.push((key, profile));
        }
    }

    /// Look up a profile by its identifier.
    ///
    /// An unknown identifier is a hard error that names the valid choices,
    /// so a typo on the command line surfaces immediately.
    pub fn get(&self, key: &str) -> Result<&CorrectionProfile> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p)
            .ok_or_else(|| ReviveError::UnknownProfile {
                requested: key.to_string(),
                known: self.keys().join(", "),
            })
    }

    /// Best-effort detection from EXIF make/model strings.
    ///
    /// Case-insensitive substring match; the first registered profile that
    /// matches wins. Returns `None` when nothing matches — detection failure
    /// is not an error, the correction stage is simply skipped.
    #[instrument(skip(self))]
    pub fn detect(&self, make: &str, model: &str) -> Option<(&str, &CorrectionProfile)> {
        let found = self
            .entries
            .iter()
            .find(|(_, p)| p.matches(make, model))
            .map(|(k, p)| (k.as_str(), p));
        if let Some((key, _)) = found {
            debug!(key, make, model, "Camera profile detected");
        }
        found
    }

    /// Registered identifiers in registration order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Load and validate a profile from a JSON file.
    ///
    /// Omitted coefficients default to zero; the noise table must be present,
    /// non-empty, and strictly ascending by ISO.
    pub fn load_profile_file(path: impl AsRef<Path>) -> Result<CorrectionProfile> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let profile: CorrectionProfile = serde_json::from_str(&text).map_err(|err| {
            ReviveError::ProfileFile(format!(
                "failed to parse {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        profile.validate()?;
        Ok(profile)
    }
}

// -- Tests --------------------------------------------------------------------
