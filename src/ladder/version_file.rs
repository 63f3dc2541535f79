use std::{
    fs,
    io::{
        BufWriter,
        ErrorKind,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
    sync::OnceLock,
};

use regex::Regex;
use tempfile::NamedTempFile;
use tracing::info;

use super::VocabularyList;
use crate::core::{
    Entry,
    NplusError,
};

pub fn parse_list(content: &str) -> Result<VocabularyList, NplusError> {
    let entries = content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.split_once('\t') {
            Some((lemma, sentence)) => {
                let sentence = sentence.trim();
                if sentence.is_empty() {
                    Entry::pending(lemma.trim())
                } else {
                    Entry::with_sentence(lemma.trim(), sentence)
                }
            }
            None => Entry::pending(line.trim()),
        })
        .collect();

    VocabularyList::from_entries(entries)
}

pub fn render_list(list: &VocabularyList) -> String {
    let mut out = String::new();
    for entry in list.entries() {
        out.push_str(&entry.lemma);
        out.push('\t');
        out.push_str(entry.sentence.as_deref().unwrap_or(""));
        out.push('\n');
    }
    out
}

pub fn read_list(path: &Path) -> Result<VocabularyList, NplusError> {
    let content = fs::read_to_string(path).map_err(|e| {
        NplusError::Custom(format!("Failed to read list file {}: {}", path.display(), e))
    })?;
    parse_list(&content)
}

fn version_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(\.[^.]+)?$").unwrap())
}

/// `1.txt` -> `2.txt`, `2.text` -> `3.text`, `17` -> `18.txt`.
pub fn next_version_path(current: &Path) -> Result<PathBuf, NplusError> {
    let name = current
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| NplusError::InvalidVersionName(current.display().to_string()))?;

    let captures = version_name_regex()
        .captures(name)
        .ok_or_else(|| NplusError::InvalidVersionName(name.to_string()))?;

    let number: u64 = captures[1]
        .parse()
        .map_err(|_| NplusError::InvalidVersionName(name.to_string()))?;
    let ext = captures.get(2).map(|m| m.as_str()).unwrap_or(".txt");

    Ok(current.with_file_name(format!("{}{}", number + 1, ext)))
}

/// Writes `list` to a brand-new file. The content lands in a temporary file next
/// to the target first and is linked into place only if nothing exists there.
pub fn write_new(list: &VocabularyList, path: &Path) -> Result<(), NplusError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if path.exists() {
        return Err(NplusError::VersionExists(path.to_path_buf()));
    }

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        writer.write_all(render_list(list).as_bytes())?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    tmp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            NplusError::VersionExists(path.to_path_buf())
        } else {
            NplusError::from(e)
        }
    })?;
    Ok(())
}

/// Persists `list` as the successor of `current` and returns the new path.
pub fn persist(list: &VocabularyList, current: &Path) -> Result<PathBuf, NplusError> {
    let next = next_version_path(current)?;
    write_new(list, &next)?;
    info!(path = %next.display(), entries = list.len(), "wrote list version");
    Ok(next)
}
