use std::{
    collections::HashMap,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use tracing::info;

use super::Normalizer;
use crate::{
    core::{
        lemma_key,
        utils::strip_punctuation,
        NplusError,
    },
    persistence::get_app_data_dir,
};

pub fn default_lexicon_path(language: &str) -> PathBuf {
    get_app_data_dir().join("lexicons").join(format!("{}.tsv", language))
}

/// Whitespace-tokenizing normalizer backed by a `form\tlemma` table.
/// Forms missing from the table are their own lemma.
#[derive(Debug, Clone, Default)]
pub struct LexiconNormalizer {
    forms: HashMap<String, String>,
}

impl LexiconNormalizer {
    pub fn from_table(content: &str) -> Self {
        let mut forms = HashMap::new();
        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((form, lemma)) = line.split_once('\t') {
                let (form, lemma) = (lemma_key(form), lemma_key(lemma));
                if !form.is_empty() && !lemma.is_empty() {
                    // first mapping for a form wins
                    forms.entry(form).or_insert(lemma);
                }
            }
        }
        Self { forms }
    }

    pub fn load(language: &str, path: Option<&Path>) -> Result<Self, NplusError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| default_lexicon_path(language));
        let content = fs::read_to_string(&path).map_err(|e| {
            NplusError::NormalizationUnavailable(format!(
                "no lexicon for language '{}' at {}: {}",
                language,
                path.display(),
                e
            ))
        })?;

        let normalizer = Self::from_table(&content);
        info!(language, path = %path.display(), forms = normalizer.len(), "lexicon loaded");
        Ok(normalizer)
    }

    /// Lower-cased surface forms, no lemma table.
    pub fn surface_forms() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl Normalizer for LexiconNormalizer {
    fn normalize(&self, text: &str) -> Result<Vec<String>, NplusError> {
        Ok(strip_punctuation(text)
            .split_whitespace()
            .map(lemma_key)
            .map(|form| self.forms.get(&form).cloned().unwrap_or(form))
            .collect())
    }
}
