use tracing::info;
use vibrato::Tokenizer;
use wana_kana::IsJapaneseStr;

use super::Normalizer;
use crate::{
    core::NplusError,
    dictionary::token_dictionary::{
        ensure_dictionary,
        load_dictionary,
        DictType,
    },
};

/// The two feature columns we need out of a vibrato token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFeature {
    pub pos1: String,
    pub base_form: Option<String>,
}

impl TokenFeature {
    pub fn parse(features: &str, dict_type: DictType) -> Self {
        let fields: Vec<&str> = features.split(',').collect();
        let field = |idx: usize| fields.get(idx).copied().filter(|f| !f.is_empty() && *f != "*");

        TokenFeature {
            pos1: field(0).unwrap_or("*").to_string(),
            base_form: field(dict_type.lemma_index()).map(str::to_string),
        }
    }
}

/// Picks the lemma for one token, or None for punctuation and whitespace.
pub fn token_lemma(surface: &str, features: &str, dict_type: DictType) -> Option<String> {
    if surface.trim().is_empty() || !surface.chars().any(char::is_alphanumeric) {
        return None;
    }

    let feature = TokenFeature::parse(features, dict_type);
    if dict_type.symbol_tags().contains(&feature.pos1.as_str()) {
        return None;
    }

    // Latin words and digits keep their folded surface; the dictionary form only
    // makes sense for Japanese text.
    if surface.is_japanese() {
        Some(feature.base_form.unwrap_or_else(|| surface.to_string()))
    } else {
        Some(surface.to_lowercase())
    }
}

pub struct JapaneseNormalizer {
    tokenizer: Tokenizer,
    dict_type: DictType,
}

impl JapaneseNormalizer {
    pub fn load(dict_type: DictType) -> Result<Self, NplusError> {
        let unavailable = |e: NplusError| {
            NplusError::NormalizationUnavailable(format!("Japanese tokenizer model: {}", e))
        };
        let dict_path = ensure_dictionary(dict_type).map_err(unavailable)?;
        let dict = load_dictionary(&dict_path).map_err(unavailable)?;
        info!(path = %dict_path.display(), "Japanese tokenizer loaded");

        Ok(Self { tokenizer: Tokenizer::new(dict), dict_type })
    }
}

impl Normalizer for JapaneseNormalizer {
    fn normalize(&self, text: &str) -> Result<Vec<String>, NplusError> {
        let mut worker = self.tokenizer.new_worker();
        worker.reset_sentence(text);
        worker.tokenize();

        Ok(worker
            .token_iter()
            .filter_map(|token| token_lemma(token.surface(), token.feature(), self.dict_type))
            .collect())
    }
}
