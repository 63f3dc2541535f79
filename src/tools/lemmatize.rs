use std::{
    fs::{
        self,
        File,
        OpenOptions,
    },
    io::{
        BufWriter,
        Write,
    },
    path::Path,
};

use rayon::prelude::*;
use tracing::{
    info,
    warn,
};

use crate::{
    core::NplusError,
    segmentation::Normalizer,
};

const CHUNK_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LemmatizeSummary {
    pub skipped: usize,
    pub written: usize,
}

/// `sentence\tlemma lemma ...`; a blank sentence maps to a blank line.
pub fn lemmatize_line(normalizer: &dyn Normalizer, sentence: &str) -> Result<String, NplusError> {
    let sentence = sentence.trim();
    if sentence.is_empty() {
        return Ok(String::new());
    }
    let lemmas = normalizer.normalize(sentence)?;
    Ok(format!("{}\t{}", sentence, lemmas.join(" ")))
}

/// Counts the newline-terminated lines of an earlier output. A trailing
/// fragment left by an interrupted write is cut off so it gets redone.
fn completed_lines(output: &Path) -> Result<usize, NplusError> {
    let existing = fs::read_to_string(output)?;
    let complete = existing.rfind('\n').map_or(0, |i| i + 1);

    if complete < existing.len() {
        warn!(
            output = %output.display(),
            fragment = existing.len() - complete,
            "dropping incomplete last line"
        );
        OpenOptions::new().write(true).open(output)?.set_len(complete as u64)?;
    }
    Ok(existing[..complete].lines().count())
}

/// Lemmatizes every line of `input` into `output`, one output line per input
/// line. With `resume`, lines already present in `output` are skipped and new
/// ones are appended.
pub fn lemmatize_file(
    input: &Path,
    output: &Path,
    normalizer: &dyn Normalizer,
    resume: bool,
) -> Result<LemmatizeSummary, NplusError> {
    let content = fs::read_to_string(input)?;
    let lines: Vec<&str> = content.lines().map(|l| l.trim_end_matches('\r')).collect();

    let skipped = if resume && output.exists() {
        completed_lines(output)?.min(lines.len())
    } else {
        0
    };

    let file = if resume {
        OpenOptions::new().create(true).append(true).open(output)?
    } else {
        File::create(output)?
    };
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for chunk in lines[skipped..].chunks(CHUNK_SIZE) {
        let rendered = chunk
            .par_iter()
            .map(|line| lemmatize_line(normalizer, line))
            .collect::<Result<Vec<_>, _>>()?;
        for line in rendered {
            writeln!(writer, "{}", line)?;
        }
        written += chunk.len();
        // flush per chunk so an interrupted job can resume
        writer.flush()?;
        info!(done = skipped + written, total = lines.len(), "lemmatizing");
    }

    Ok(LemmatizeSummary { skipped, written })
}
