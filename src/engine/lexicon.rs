//! User lexicon files handed to the recognition engine.
//!
//! Domain vocabulary and citation patterns improve recognition of proper
//! names and technical terms the engine's stock language models miss. The
//! files are temp-backed and owned by the invoker's parameter builder;
//! dropping the lexicon removes them on every exit path.

use crate::core::config::ModelProfile;
use crate::core::errors::OcrResult;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Curated domain terms the stock models frequently mangle.
const DOMAIN_TERMS: &[&str] = &[
    "psicanálise",
    "Freud",
    "Lacan",
    "inconsciente",
    "transferência",
    "recalque",
    "sintoma",
    "gozo",
    "objeto a",
    "Édipo",
    "Jacques",
    "Sigmund",
    "Winnicott",
    "Bion",
];

/// Citation shapes common in academic texts.
const CITATION_PATTERNS: &[&str] = &[
    r"\d{4}[a-z]?",
    r"[A-Z]\.[A-Z]\.",
    r"\d+-\d+",
    r"p\. \d+",
];

/// Temp-file-backed engine lexicon. Word list always present; pattern list
/// only under the best profile, where the engine actually consults it.
#[derive(Debug)]
pub struct UserLexicon {
    words: NamedTempFile,
    patterns: Option<NamedTempFile>,
}

impl UserLexicon {
    /// Writes the lexicon files for the given profile.
    pub fn prepare(profile: ModelProfile) -> OcrResult<Self> {
        let words = write_lines(DOMAIN_TERMS)?;
        let patterns = if profile == ModelProfile::Best {
            Some(write_lines(CITATION_PATTERNS)?)
        } else {
            None
        };
        Ok(UserLexicon { words, patterns })
    }

    /// Path of the word list file.
    pub fn words_path(&self) -> &Path {
        self.words.path()
    }

    /// Path of the pattern list file, when present.
    pub fn patterns_path(&self) -> Option<&Path> {
        self.patterns.as_ref().map(|f| f.path())
    }
}

fn write_lines(lines: &[&str]) -> OcrResult<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile()?;
    file.write_all(lines.join("\n").as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_profile_writes_words_only() {
        let lexicon = UserLexicon::prepare(ModelProfile::Standard).unwrap();
        assert!(lexicon.words_path().exists());
        assert!(lexicon.patterns_path().is_none());
        let contents = std::fs::read_to_string(lexicon.words_path()).unwrap();
        assert!(contents.contains("Freud"));
    }

    #[test]
    fn best_profile_adds_patterns() {
        let lexicon = UserLexicon::prepare(ModelProfile::Best).unwrap();
        assert!(lexicon.patterns_path().is_some());
    }

    #[test]
    fn files_are_removed_on_drop() {
        let lexicon = UserLexicon::prepare(ModelProfile::Standard).unwrap();
        let path = lexicon.words_path().to_path_buf();
        drop(lexicon);
        assert!(!path.exists());
    }
}
