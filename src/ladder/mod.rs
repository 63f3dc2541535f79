pub mod evaluator;
pub mod repair;
pub mod version_file;

#[cfg(test)]
mod repair_tests;

use std::collections::{
    HashMap,
    HashSet,
};

use crate::core::{
    lemma_key,
    Entry,
    NplusError,
};

/// Ordered lemma list with a key → position index. Every structural change goes
/// through `insert_before`/`remove_at` so uniqueness is enforced in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyList {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl VocabularyList {
    pub fn from_entries(entries: Vec<Entry>) -> Result<Self, NplusError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if index.insert(entry.key(), pos).is_some() {
                return Err(NplusError::DuplicateLemmaDetected(entry.lemma.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<&Entry> {
        self.entries.get(pos)
    }

    pub fn position(&self, lemma: &str) -> Option<usize> {
        self.index.get(&lemma_key(lemma)).copied()
    }

    pub fn contains(&self, lemma: &str) -> bool {
        self.index.contains_key(&lemma_key(lemma))
    }

    pub fn insert_before(&mut self, anchor: &str, entry: Entry) -> Result<usize, NplusError> {
        if self.contains(&entry.lemma) {
            return Err(NplusError::DuplicateLemmaDetected(entry.lemma));
        }
        let pos = self.position(anchor).ok_or_else(|| {
            NplusError::InvariantViolation(format!("anchor lemma '{}' is not in the list", anchor))
        })?;

        self.entries.insert(pos, entry);
        self.reindex_from(pos);
        Ok(pos)
    }

    pub fn remove_at(&mut self, pos: usize) -> Option<Entry> {
        if pos >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(pos);
        self.index.remove(&entry.key());
        self.reindex_from(pos);
        Some(entry)
    }

    pub fn set_sentence(&mut self, pos: usize, sentence: &str) -> Result<(), NplusError> {
        let entry = self.entries.get_mut(pos).ok_or_else(|| {
            NplusError::InvariantViolation(format!("position {} is out of range", pos))
        })?;
        entry.sentence = Some(sentence.to_string());
        Ok(())
    }

    /// Recounts keys from scratch instead of trusting the index.
    pub fn check_unique(&self) -> Result<(), NplusError> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.key()) {
                return Err(NplusError::DuplicateLemmaDetected(entry.lemma.clone()));
            }
        }
        Ok(())
    }

    fn reindex_from(&mut self, start: usize) {
        for (pos, entry) in self.entries.iter().enumerate().skip(start) {
            self.index.insert(entry.key(), pos);
        }
    }
}

/// The list plus the size of the base vocabulary that is never targeted.
/// The cursor is derived: the first pending entry at or after `skip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderState {
    pub list: VocabularyList,
    pub skip: usize,
}

impl LadderState {
    pub fn new(list: VocabularyList, skip: usize) -> Result<Self, NplusError> {
        let state = Self { list, skip };
        state.check_invariants()?;
        Ok(state)
    }

    pub fn cursor(&self) -> Option<usize> {
        let start = self.skip.min(self.list.len());
        (start..self.list.len()).find(|&pos| self.list.entries[pos].is_pending())
    }

    pub fn target(&self) -> Result<(usize, &Entry), NplusError> {
        self.cursor()
            .map(|pos| (pos, &self.list.entries[pos]))
            .ok_or(NplusError::ListExhausted { skip: self.skip })
    }

    /// Keys of every entry above the cursor, base vocabulary included.
    pub fn known_lemmas(&self) -> HashSet<String> {
        let end = self.cursor().unwrap_or(self.list.len());
        self.list.entries[..end].iter().map(Entry::key).collect()
    }

    pub fn committed_count(&self) -> usize {
        let start = self.skip.min(self.list.len());
        let end = self.cursor().unwrap_or(self.list.len());
        end - start
    }

    pub fn check_invariants(&self) -> Result<(), NplusError> {
        self.list.check_unique()?;

        if let Some(cursor) = self.cursor() {
            if let Some((offset, entry)) =
                self.list.entries[cursor..].iter().enumerate().find(|(_, e)| !e.is_pending())
            {
                return Err(NplusError::InvariantViolation(format!(
                    "'{}' at position {} has a sentence but sits below the cursor ({})",
                    entry.lemma,
                    cursor + offset,
                    cursor
                )));
            }
        }
        Ok(())
    }
}
