use std::collections::HashSet;

use proptest::prelude::*;

use super::{
    evaluator::{
        evaluate,
        TieBreak,
    },
    repair::commit,
    LadderState,
    VocabularyList,
};
use crate::core::{
    Candidate,
    Entry,
    NplusError,
};

fn candidate(sentence: &str, lemmas: &[&str]) -> Candidate {
    Candidate::new(sentence, lemmas.iter().map(|l| l.to_string()).collect())
}

/// `committed` entries with sentences followed by pending ones, no base vocabulary.
fn state(committed: &[&str], pending: &[&str]) -> LadderState {
    let mut entries: Vec<Entry> =
        committed.iter().map(|l| Entry::with_sentence(*l, format!("A {} sentence.", l))).collect();
    entries.extend(pending.iter().map(|l| Entry::pending(*l)));
    LadderState::new(VocabularyList::from_entries(entries).unwrap(), 0).unwrap()
}

fn lemmas_of(state: &LadderState) -> Vec<&str> {
    state.list.entries().iter().map(|e| e.lemma.as_str()).collect()
}

fn step(
    state: &LadderState,
    candidates: &[Candidate],
) -> Result<(LadderState, crate::core::StepReport), NplusError> {
    let (_, target) = state.target()?;
    let target = target.lemma.clone();
    let evaluation = evaluate(&target, &state.known_lemmas(), candidates, TieBreak::default())?;
    commit(state, &target, &evaluation.winner, &evaluation.new_lemmas)
}

#[test]
fn test_zero_new_commit_advances_by_one() {
    let before = state(&["a", "b", "c"], &["target", "later"]);
    let winner = candidate("A b c target.", &["a", "b", "c", "target"]);

    let (after, report) = commit(&before, "target", &winner, &[]).unwrap();

    assert_eq!(after.cursor(), Some(4));
    assert_eq!(before.cursor(), Some(3));
    assert_eq!(after.list.get(3).unwrap().sentence.as_deref(), Some("A b c target."));
    assert_eq!(report.committed_sentence.as_deref(), Some("A b c target."));
    assert!(report.reorders.is_empty());
    assert!(report.out_of_bounds.is_empty());
    assert_eq!(lemmas_of(&after), lemmas_of(&before));
}

#[test]
fn test_out_of_bounds_insertion_before_target() {
    let committed: Vec<String> = (0..61).map(|i| format!("w{}", i)).collect();
    let committed: Vec<&str> = committed.iter().map(String::as_str).collect();
    let before = state(&committed, &["carry", "table"]);
    assert_eq!(before.cursor(), Some(61));

    let winner = candidate("Carry the heavy box.", &["carry", "w1", "heavy", "box"]);
    let (after, report) = step(&before, &[winner]).unwrap();

    assert_eq!(after.list.get(61).unwrap(), &Entry::pending("heavy"));
    assert_eq!(after.list.get(62).unwrap(), &Entry::pending("box"));
    assert_eq!(after.list.get(63).unwrap(), &Entry::pending("carry"));
    assert_eq!(after.list.get(64).unwrap().lemma, "table");
    assert_eq!(report.out_of_bounds, vec!["heavy", "box"]);
    assert!(report.reorders.is_empty());
    assert!(report.committed_sentence.is_none());
    assert_eq!(report.rejected_sentence.as_deref(), Some("Carry the heavy box."));
    assert_eq!(after.cursor(), Some(61));
    assert_eq!(after.target().unwrap().1.lemma, "heavy");
}

#[test]
fn test_reorder_removes_lower_copy() {
    let pending: Vec<String> = std::iter::once("coat".to_string())
        .chain((1..900).map(|i| format!("p{}", i)))
        .chain(std::iter::once("yesterday".to_string()))
        .collect();
    let pending: Vec<&str> = pending.iter().map(String::as_str).collect();
    let before = state(&["i", "buy", "a"], &pending);
    assert_eq!(before.list.position("yesterday"), Some(903));

    let winner = candidate("I bought a coat yesterday.", &["i", "buy", "a", "coat", "yesterday"]);
    let (after, report) = step(&before, &[winner]).unwrap();

    assert_eq!(report.reorders, vec!["yesterday"]);
    assert!(report.out_of_bounds.is_empty());
    assert_eq!(after.list.position("yesterday"), Some(3));
    assert_eq!(after.list.position("coat"), Some(4));
    assert_eq!(after.list.len(), before.list.len());
    assert_eq!(after.list.entries().iter().filter(|e| e.lemma == "yesterday").count(), 1);
    assert_eq!(after.list.entries().last().unwrap().lemma, "p899");
    after.list.check_unique().unwrap();
}

#[test]
fn test_mixed_reorder_and_insert_keep_sentence_order() {
    let before = state(&["the"], &["dog", "cat", "run"]);
    let winner = candidate("The fast dog runs.", &["the", "fast", "dog", "run"]);

    let (after, report) = commit(&before, "dog", &winner, &["fast".into(), "run".into()]).unwrap();

    assert_eq!(lemmas_of(&after), vec!["the", "fast", "run", "dog", "cat"]);
    assert_eq!(report.out_of_bounds, vec!["fast"]);
    assert_eq!(report.reorders, vec!["run"]);
    assert_eq!(after.target().unwrap().1.lemma, "fast");
}

#[test]
fn test_nested_prerequisites_resolve_depth_first() {
    let s0 = state(&["the"], &["carry", "table"]);

    let (s1, _) = step(&s0, &[candidate("Carry the heavy box.", &["carry", "the", "heavy", "box"])])
        .unwrap();
    assert_eq!(s1.target().unwrap().1.lemma, "heavy");

    // "heavy" drags in "very"
    let (s2, r2) =
        step(&s1, &[candidate("The very heavy.", &["the", "very", "heavy"])]).unwrap();
    assert_eq!(r2.out_of_bounds, vec!["very"]);
    assert_eq!(lemmas_of(&s2), vec!["the", "very", "heavy", "box", "carry", "table"]);

    let (s3, _) = step(&s2, &[candidate("The very.", &["the", "very"])]).unwrap();
    let (s4, _) = step(&s3, &[candidate("The very heavy.", &["the", "very", "heavy"])]).unwrap();
    let (s5, _) = step(&s4, &[candidate("The heavy box.", &["the", "heavy", "box"])]).unwrap();
    let (s6, r6) =
        step(&s5, &[candidate("Carry the heavy box.", &["carry", "the", "heavy", "box"])]).unwrap();

    assert_eq!(r6.committed_sentence.as_deref(), Some("Carry the heavy box."));
    assert_eq!(s6.target().unwrap().1.lemma, "table");
    assert_eq!(s6.committed_count(), 5);
}

#[test]
fn test_no_valid_candidate_leaves_state_unchanged() {
    let before = state(&["i"], &["coat"]);
    let snapshot = before.clone();

    let err = step(&before, &[candidate("I run.", &["i", "run"])]).unwrap_err();

    assert!(matches!(err, NplusError::NoValidCandidate(_)));
    assert_eq!(before, snapshot);
}

#[test]
fn test_commit_rejects_wrong_target() {
    let before = state(&[], &["coat", "hat"]);
    let err = commit(&before, "hat", &candidate("A hat.", &["a", "hat"]), &[]).unwrap_err();
    assert!(matches!(err, NplusError::InvariantViolation(_)));
}

#[test]
fn test_base_vocabulary_counts_as_known() {
    let list = VocabularyList::from_entries(vec![
        Entry::pending("i"),
        Entry::pending("see"),
        Entry::pending("bird"),
        Entry::pending("tree"),
    ])
    .unwrap();
    let before = LadderState::new(list, 2).unwrap();

    let (after, report) = step(&before, &[candidate("I see birds.", &["i", "see", "bird"])]).unwrap();

    assert!(report.committed_sentence.is_some());
    assert_eq!(after.cursor(), Some(3));
    assert!(after.list.get(0).unwrap().is_pending());
}

proptest! {
    #[test]
    fn prop_steps_keep_list_unique_and_cursor_monotonic(
        batches in prop::collection::vec(
            prop::collection::vec(prop::collection::vec(0usize..40, 1..8), 1..4),
            1..25,
        )
    ) {
        let pending: Vec<String> = (0..20).map(|i| format!("w{}", i)).collect();
        let mut current = LadderState::new(
            VocabularyList::from_entries(pending.iter().map(Entry::pending).collect()).unwrap(),
            0,
        )
        .unwrap();
        let mut last_cursor = current.cursor().unwrap_or(current.list.len());

        for batch in batches {
            let Ok((_, target)) = current.target() else { break };
            let target = target.lemma.clone();

            let candidates: Vec<Candidate> = batch
                .iter()
                .enumerate()
                .map(|(i, ids)| {
                    let mut lemmas: Vec<String> = ids.iter().map(|id| format!("w{}", id)).collect();
                    // every other candidate omits the target
                    if i % 2 == 0 {
                        lemmas.push(target.clone());
                    }
                    Candidate::new(lemmas.join(" "), lemmas)
                })
                .collect();

            match step(&current, &candidates) {
                Ok((next, _)) => current = next,
                Err(NplusError::NoValidCandidate(_)) => continue,
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }

            let keys: HashSet<String> = current.list.entries().iter().map(Entry::key).collect();
            prop_assert_eq!(keys.len(), current.list.len());
            current.check_invariants().unwrap();

            let cursor = current.cursor().unwrap_or(current.list.len());
            prop_assert!(cursor >= last_cursor);
            last_cursor = cursor;
        }
    }
}
