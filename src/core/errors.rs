use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NplusError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error("Vibrato error: {0}")]
    Vibrato(Box<vibrato::errors::VibratoError>),

    #[error("Sentence generation failed: {0}")]
    GenerationFailure(String),

    #[error("Normalization unavailable: {0}")]
    NormalizationUnavailable(String),

    #[error("No generated sentence contained the lemma '{0}'")]
    NoValidCandidate(String),

    #[error("Duplicate lemma detected: '{0}'")]
    DuplicateLemmaDetected(String),

    #[error("List invariant violated: {0}")]
    InvariantViolation(String),

    #[error("No unfinished lemma found after the first {skip} entries")]
    ListExhausted { skip: usize },

    #[error("Version file name must be numeric (e.g. 1.txt): {0}")]
    InvalidVersionName(String),

    #[error("Version file already exists: {0:?}")]
    VersionExists(PathBuf),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("NplusError: {0}")]
    Custom(String),
}

impl NplusError {
    /// Failures that only cost the current step; a fresh attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NplusError::GenerationFailure(_) | NplusError::NoValidCandidate(_))
    }
}

impl From<std::io::Error> for NplusError {
    fn from(error: std::io::Error) -> Self {
        NplusError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for NplusError {
    fn from(error: reqwest::Error) -> Self {
        NplusError::Reqwest(Box::new(error))
    }
}

impl From<vibrato::errors::VibratoError> for NplusError {
    fn from(error: vibrato::errors::VibratoError) -> Self {
        NplusError::Vibrato(Box::new(error))
    }
}

impl From<tempfile::PersistError> for NplusError {
    fn from(error: tempfile::PersistError) -> Self {
        NplusError::Io(Box::new(error.error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(NplusError::GenerationFailure("quota".into()).is_retryable());
        assert!(NplusError::NoValidCandidate("coat".into()).is_retryable());
        assert!(!NplusError::NormalizationUnavailable("no lexicon".into()).is_retryable());
        assert!(!NplusError::DuplicateLemmaDetected("coat".into()).is_retryable());
        assert!(!NplusError::from(std::io::Error::other("disk full")).is_retryable());
    }
}
