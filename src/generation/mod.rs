pub mod openai;

use crate::core::NplusError;

pub use openai::OpenAiProposer;

/// Produces candidate sentences for a lemma. Implementations may return fewer
/// than `count` sentences and give no guarantee the lemma actually appears.
pub trait SentenceProposer {
    fn propose(
        &self,
        lemma: &str,
        count: usize,
        min_words: usize,
        max_words: usize,
    ) -> Result<Vec<String>, NplusError>;
}
