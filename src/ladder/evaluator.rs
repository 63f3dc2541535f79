use std::collections::HashSet;

use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use crate::core::{
    lemma_key,
    Candidate,
    NplusError,
};

/// How to order candidates that introduce the same number of new lemmas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    #[default]
    EarliestGenerated,
    FewestTokens,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub winner: Candidate,
    pub index: usize,
    pub new_lemmas: Vec<String>,
    pub valid_candidates: usize,
}

/// Lemmas of `candidate` that are neither known nor the target, in sentence order.
pub fn new_lemma_set(target: &str, known: &HashSet<String>, candidate: &Candidate) -> Vec<String> {
    let target_key = lemma_key(target);
    candidate
        .lemmas
        .iter()
        .filter(|l| **l != target_key && !known.contains(*l))
        .cloned()
        .collect()
}

pub fn evaluate(
    target: &str,
    known: &HashSet<String>,
    candidates: &[Candidate],
    tie_break: TieBreak,
) -> Result<Evaluation, NplusError> {
    let target_key = lemma_key(target);

    let mut scored: Vec<(usize, &Candidate, Vec<String>)> = Vec::new();
    for (idx, candidate) in candidates.iter().enumerate() {
        if !candidate.contains(&target_key) {
            debug!(index = idx, sentence = %candidate.sentence, "candidate omits target lemma");
            continue;
        }

        let new_lemmas = new_lemma_set(target, known, candidate);
        debug!(
            index = idx,
            sentence = %candidate.sentence,
            new = new_lemmas.len(),
            "scored candidate"
        );

        let perfect = new_lemmas.is_empty();
        scored.push((idx, candidate, new_lemmas));

        // Nothing later can beat the earliest zero-new candidate under this policy.
        if perfect && tie_break == TieBreak::EarliestGenerated {
            break;
        }
    }

    let valid_candidates = candidates.iter().filter(|c| c.contains(&target_key)).count();

    // min_by_key keeps the first of equal elements, so generation order breaks remaining ties
    let best = scored.into_iter().min_by_key(|(idx, candidate, new_lemmas)| match tie_break {
        TieBreak::EarliestGenerated => (new_lemmas.len(), 0, *idx),
        TieBreak::FewestTokens => (new_lemmas.len(), candidate.token_count, *idx),
    });

    match best {
        Some((index, winner, new_lemmas)) => {
            Ok(Evaluation { winner: winner.clone(), index, new_lemmas, valid_candidates })
        }
        None => Err(NplusError::NoValidCandidate(target.to_string())),
    }
}
