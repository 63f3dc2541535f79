use std::{
    collections::HashSet,
    fs,
    path::Path,
};

use tracing::info;

use crate::core::{
    lemma_key,
    NplusError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    pub lines: Vec<String>,
    pub repeated: Vec<String>, // lemmas seen again, in the order met
}

/// Keeps the first line for every lemma (first tab-separated field).
pub fn dedup_lines(content: &str) -> DedupOutcome {
    let mut seen = HashSet::new();
    let mut outcome = DedupOutcome::default();

    for line in content.lines().map(|l| l.trim_end_matches('\r')) {
        let lemma = line.split('\t').next().unwrap_or("").trim();
        if lemma.is_empty() {
            continue;
        }
        if seen.insert(lemma_key(lemma)) {
            outcome.lines.push(line.trim().to_string());
        } else {
            outcome.repeated.push(lemma.to_string());
        }
    }
    outcome
}

pub fn dedup_file(input: &Path, output: &Path) -> Result<DedupOutcome, NplusError> {
    if input == output {
        return Err(NplusError::Custom("refusing to overwrite the input list".into()));
    }

    let content = fs::read_to_string(input)?;
    let outcome = dedup_lines(&content);

    let mut text = outcome.lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    fs::write(output, text)?;

    info!(
        output = %output.display(),
        kept = outcome.lines.len(),
        repeated = outcome.repeated.len(),
        "duplicates removed"
    );
    Ok(outcome)
}
