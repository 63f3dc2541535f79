pub mod japanese;
pub mod lexicon;

use std::path::Path;

use rayon::prelude::*;

use crate::{
    core::{
        Candidate,
        NplusError,
    },
    dictionary::token_dictionary::DictType,
};

pub use japanese::JapaneseNormalizer;
pub use lexicon::LexiconNormalizer;

/// Reduces text to its base word-forms, in reading order. The language is
/// fixed when the normalizer is built.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str) -> Result<Vec<String>, NplusError>;
}

pub fn normalizer_for(
    language: &str,
    lexicon: Option<&Path>,
    surface_forms: bool,
) -> Result<Box<dyn Normalizer>, NplusError> {
    match language {
        "ja" => Ok(Box::new(JapaneseNormalizer::load(DictType::Unidic)?)),
        _ if surface_forms => Ok(Box::new(LexiconNormalizer::surface_forms())),
        _ => Ok(Box::new(LexiconNormalizer::load(language, lexicon)?)),
    }
}

/// Lemmatizes a batch in parallel; output order matches `sentences`.
pub fn to_candidates(
    normalizer: &dyn Normalizer,
    sentences: &[String],
) -> Result<Vec<Candidate>, NplusError> {
    sentences
        .par_iter()
        .map(|sentence| {
            let lemmas = normalizer.normalize(sentence)?;
            Ok(Candidate::new(sentence.clone(), lemmas))
        })
        .collect()
}
