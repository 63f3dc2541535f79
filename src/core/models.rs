use std::{
    collections::HashSet,
    path::PathBuf,
};

use serde::Serialize;

/// Identity of a lemma inside the list. Case is folded so "Coat" and "coat"
/// cannot both occupy a slot.
pub fn lemma_key(lemma: &str) -> String {
    lemma.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub lemma: String,
    pub sentence: Option<String>, // None while pending
}

impl Entry {
    pub fn pending(lemma: impl Into<String>) -> Self {
        Entry { lemma: lemma.into(), sentence: None }
    }

    pub fn with_sentence(lemma: impl Into<String>, sentence: impl Into<String>) -> Self {
        Entry { lemma: lemma.into(), sentence: Some(sentence.into()) }
    }

    pub fn key(&self) -> String {
        lemma_key(&self.lemma)
    }

    pub fn is_pending(&self) -> bool {
        self.sentence.as_deref().map(str::trim).map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub sentence: String,
    pub lemmas: Vec<String>, // canonical keys, first-appearance order, no repeats
    pub token_count: usize,
}

impl Candidate {
    pub fn new(sentence: impl Into<String>, raw_lemmas: Vec<String>) -> Self {
        let token_count = raw_lemmas.iter().filter(|l| !l.trim().is_empty()).count();
        let mut seen = HashSet::new();
        let lemmas = raw_lemmas
            .iter()
            .map(|l| lemma_key(l))
            .filter(|l| !l.is_empty())
            .filter(|l| seen.insert(l.clone()))
            .collect();

        Candidate { sentence: sentence.into(), lemmas, token_count }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lemmas.iter().any(|l| l == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub version: Option<PathBuf>,
    pub target: String,
    pub committed_sentence: Option<String>,
    pub rejected_sentence: Option<String>,
    pub reorders: Vec<String>,
    pub out_of_bounds: Vec<String>,
    pub valid_candidates: usize,
}

impl StepReport {
    pub fn introduced_count(&self) -> usize {
        self.reorders.len() + self.out_of_bounds.len()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(version) = &self.version {
            out.push_str(&format!("File: {}\n", version.display()));
        }
        out.push_str(&format!("  Lemma: {}\n", self.target));
        match (&self.committed_sentence, &self.rejected_sentence) {
            (Some(sentence), _) => out.push_str(&format!("  Sentence: {}\n", sentence)),
            (None, Some(sentence)) => out.push_str(&format!("  Rejected sentence: {}\n", sentence)),
            (None, None) => {}
        }

        if self.introduced_count() == 0 {
            out.push_str("  Unknown lemmas introduced: 0\n");
        } else {
            out.push_str(&format!(
                "  Out-of-bound lemmas ({}): {}\n",
                self.out_of_bounds.len(),
                join_or_none(&self.out_of_bounds)
            ));
            out.push_str(&format!(
                "  Re-orders ({}): {}\n",
                self.reorders.len(),
                join_or_none(&self.reorders)
            ));
        }
        out
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}
