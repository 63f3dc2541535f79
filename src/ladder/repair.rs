use tracing::{
    debug,
    warn,
};

use super::LadderState;
use crate::core::{
    lemma_key,
    Candidate,
    Entry,
    NplusError,
    StepReport,
};

/// Applies a winning candidate to a copy of `state`.
///
/// With no new lemmas the sentence is attached to the target and the cursor
/// moves past it. Otherwise every new lemma is placed directly above the target
/// (moved up if it is further down the list, inserted if the list has never
/// seen it) and the sentence is dropped; the cursor then sits on the first
/// prerequisite and the target is retried once those are done.
///
/// `state` is left untouched whatever the outcome.
pub fn commit(
    state: &LadderState,
    target: &str,
    winner: &Candidate,
    new_lemmas: &[String],
) -> Result<(LadderState, StepReport), NplusError> {
    let (cursor, target_entry) = state.target()?;
    let target_key = lemma_key(target);
    if target_entry.key() != target_key {
        return Err(NplusError::InvariantViolation(format!(
            "'{}' is not the lemma at the cursor ('{}')",
            target, target_entry.lemma
        )));
    }

    let mut next = state.clone();
    let mut report = StepReport { target: target_entry.lemma.clone(), ..Default::default() };

    for lemma in new_lemmas {
        let key = lemma_key(lemma);
        if key.is_empty() || key == target_key {
            continue;
        }

        let target_pos = next.list.position(&target_key).ok_or_else(|| {
            NplusError::InvariantViolation(format!("target '{}' vanished from the list", target))
        })?;

        match next.list.position(&key) {
            Some(pos) if pos > target_pos => {
                let moved = next.list.remove_at(pos).ok_or_else(|| {
                    NplusError::InvariantViolation(format!("no entry at position {}", pos))
                })?;
                debug!(lemma = %moved.lemma, from = pos, to = target_pos, "re-ordering lemma");
                report.reorders.push(moved.lemma.clone());
                next.list.insert_before(&target_key, moved)?;
            }
            Some(pos) => {
                // Already above the target, so it was known or placed earlier in this step.
                warn!(lemma = %key, position = pos, "new lemma already precedes target, skipping");
            }
            None => {
                debug!(lemma = %key, before = %target, "inserting out-of-bounds lemma");
                report.out_of_bounds.push(key.clone());
                next.list.insert_before(&target_key, Entry::pending(key))?;
            }
        }
    }

    if report.introduced_count() == 0 {
        next.list.set_sentence(cursor, &winner.sentence)?;
        report.committed_sentence = Some(winner.sentence.clone());
    } else {
        report.rejected_sentence = Some(winner.sentence.clone());
    }

    next.check_invariants()?;

    let next_cursor = next.cursor().unwrap_or(next.list.len());
    if next_cursor < cursor {
        return Err(NplusError::InvariantViolation(format!(
            "cursor moved backwards from {} to {}",
            cursor, next_cursor
        )));
    }

    Ok((next, report))
}
