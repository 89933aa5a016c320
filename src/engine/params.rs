//! Engine parameter construction.
//!
//! Renders the engine-facing parameter string deterministically and builds
//! the structured [`EngineParams`] the backend consumes. Rendered strings
//! are memoized in an explicit table keyed by (psm, oem, extra), owned by
//! the builder instance.

use crate::core::config::ModelProfile;
use crate::core::errors::OcrResult;
use crate::core::traits::EngineParams;
use crate::engine::lexicon::UserLexicon;
use crate::policy::EngineConfig;
use std::collections::HashMap;
use std::sync::Mutex;

/// Stability tuning flags appended to every parameter string.
const STABILITY_FLAGS: &str =
    "-c preserve_interword_spaces=1 -c textord_min_linesize=2.5 -c textord_initialx_ile=1.0";

/// Deterministic, memoizing builder for engine parameter strings.
pub struct ParamBuilder {
    profile: ModelProfile,
    languages: String,
    lexicon: UserLexicon,
    rendered: Mutex<HashMap<(u8, u8, String), String>>,
}

impl ParamBuilder {
    /// Creates a builder for the given profile, preparing the lexicon files.
    pub fn new(profile: ModelProfile, languages: impl Into<String>) -> OcrResult<Self> {
        Ok(ParamBuilder {
            profile,
            languages: languages.into(),
            lexicon: UserLexicon::prepare(profile)?,
            rendered: Mutex::new(HashMap::new()),
        })
    }

    /// Structured parameters for a selected engine configuration.
    pub fn params(&self, config: &EngineConfig) -> EngineParams {
        self.params_for(config.page_segmentation_mode, config.engine_mode.oem())
    }

    /// Structured parameters for an explicit (psm, oem) pair, used by the
    /// fallback ladder.
    pub fn params_for(&self, psm: u8, oem: u8) -> EngineParams {
        EngineParams {
            psm,
            oem,
            languages: self.languages.clone(),
            timeout: Some(self.profile.engine_timeout()),
            extra: self.profile_flags(),
        }
    }

    /// Renders (and memoizes) the full engine-facing parameter string, used
    /// for cache traceability and the `config_used` field of results.
    pub fn render(&self, psm: u8, oem: u8, extra: &str) -> String {
        let key = (psm, oem, extra.to_string());
        let mut memo = self.rendered.lock().unwrap();
        if let Some(hit) = memo.get(&key) {
            return hit.clone();
        }

        let mut parts = vec![format!("--oem {oem}"), format!("--psm {psm}")];
        let profile_flags = self.profile_flags();
        if !profile_flags.is_empty() {
            parts.push(profile_flags);
        }
        parts.push(STABILITY_FLAGS.to_string());
        if !extra.is_empty() {
            parts.push(extra.to_string());
        }
        let rendered = parts.join(" ");
        memo.insert(key, rendered.clone());
        rendered
    }

    fn profile_flags(&self) -> String {
        let mut flags = format!("--user-words {}", self.lexicon.words_path().display());
        if let Some(patterns) = self.lexicon.patterns_path() {
            flags.push_str(&format!(" --user-patterns {}", patterns.display()));
        }
        flags
    }
}
