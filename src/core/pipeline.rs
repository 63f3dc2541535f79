use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Instant,
};

use tracing::{
    debug,
    info,
    warn,
};

use super::{
    NplusError,
    StepReport,
};
use crate::{
    generation::SentenceProposer,
    ladder::{
        evaluator::evaluate,
        repair::commit,
        version_file::{
            persist,
            read_list,
        },
        LadderState,
    },
    persistence::Settings,
    segmentation::{
        to_candidates,
        Normalizer,
    },
};

#[derive(Debug)]
pub struct RunSummary {
    pub reports: Vec<StepReport>,
    pub last_version: PathBuf,
    pub stopped_by: Option<NplusError>,
}

/// One full step against `state`: propose, lemmatize, evaluate, repair. Nothing
/// is written and `state` itself is never modified.
pub fn run_step(
    state: &LadderState,
    proposer: &dyn SentenceProposer,
    normalizer: &dyn Normalizer,
    settings: &Settings,
) -> Result<(LadderState, StepReport), NplusError> {
    let (cursor, target) = state.target()?;
    let target = target.lemma.clone();
    info!(lemma = %target, cursor, "next target");

    let sentences =
        proposer.propose(&target, settings.batch_size, settings.min_words, settings.max_words)?;
    let candidates = to_candidates(normalizer, &sentences)?;

    let evaluation = evaluate(&target, &state.known_lemmas(), &candidates, settings.tie_break)?;
    debug!(
        index = evaluation.index,
        new = evaluation.new_lemmas.len(),
        valid = evaluation.valid_candidates,
        "winner selected"
    );

    let (next, mut report) =
        commit(state, &target, &evaluation.winner, &evaluation.new_lemmas)?;
    report.valid_candidates = evaluation.valid_candidates;
    Ok((next, report))
}

/// Runs up to `steps` steps starting from the version file `start`, writing a
/// new version after each committed step. `on_report` sees every report as
/// soon as its version is on disk.
pub fn run(
    start: &Path,
    steps: usize,
    proposer: &dyn SentenceProposer,
    normalizer: &dyn Normalizer,
    settings: &Settings,
    mut on_report: impl FnMut(&StepReport),
) -> Result<RunSummary, NplusError> {
    settings.validate()?;
    let total_start = Instant::now();

    let mut state = LadderState::new(read_list(start)?, settings.skip)?;
    let mut current = start.to_path_buf();
    let mut summary =
        RunSummary { reports: Vec::new(), last_version: current.clone(), stopped_by: None };

    if steps == 0 {
        info!("nothing to do: step count is 0");
        return Ok(summary);
    }

    'steps: for step in 1..=steps {
        let mut attempt = 0;
        let (next, mut report) = loop {
            attempt += 1;
            match run_step(&state, proposer, normalizer, settings) {
                Ok(outcome) => break outcome,
                Err(e) if e.is_retryable() && attempt < settings.max_attempts => {
                    warn!(step, attempt, error = %e, "step failed, retrying");
                }
                Err(e) if stops_quietly(&e) => {
                    warn!(step, error = %e, "stopping run");
                    summary.stopped_by = Some(e);
                    break 'steps;
                }
                Err(e) => return Err(e),
            }
        };

        // The new state only replaces the old one once its file exists.
        let path = persist(&next.list, &current)?;
        report.version = Some(path.clone());
        on_report(&report);

        state = next;
        current = path;
        summary.last_version = current.clone();
        summary.reports.push(report);
    }

    info!(
        steps = summary.reports.len(),
        elapsed = ?total_start.elapsed(),
        "run finished"
    );
    Ok(summary)
}

/// Failures that end the run but leave every written version valid.
fn stops_quietly(error: &NplusError) -> bool {
    error.is_retryable() || matches!(error, NplusError::ListExhausted { .. })
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::VecDeque,
        fs,
    };

    use super::*;
    use crate::segmentation::LexiconNormalizer;

    struct ScriptedProposer {
        batches: RefCell<VecDeque<Result<Vec<String>, NplusError>>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedProposer {
        fn new(batches: Vec<Result<Vec<&str>, NplusError>>) -> Self {
            let batches = batches
                .into_iter()
                .map(|b| b.map(|s| s.into_iter().map(String::from).collect()))
                .collect();
            Self { batches: RefCell::new(batches), calls: RefCell::new(Vec::new()) }
        }
    }

    impl SentenceProposer for ScriptedProposer {
        fn propose(&self, lemma: &str, _: usize, _: usize, _: usize) -> Result<Vec<String>, NplusError> {
            self.calls.borrow_mut().push(lemma.to_string());
            self.batches
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(NplusError::GenerationFailure("script exhausted".into())))
        }
    }

    struct BrokenNormalizer;

    impl Normalizer for BrokenNormalizer {
        fn normalize(&self, _: &str) -> Result<Vec<String>, NplusError> {
            Err(NplusError::NormalizationUnavailable("no models".into()))
        }
    }

    fn settings(skip: usize) -> Settings {
        Settings { skip, ..Settings::default() }
    }

    fn setup(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let start = dir.path().join("1.txt");
        fs::write(&start, content).unwrap();
        (dir, start)
    }

    #[test]
    fn test_run_writes_one_version_per_step() {
        let (dir, start) = setup("i\nsee\nbird\ntree\nsky\n");
        let proposer = ScriptedProposer::new(vec![
            Ok(vec!["I see a bird.", "I see birds."]),
            Ok(vec!["I see a tall tree."]),
        ]);
        let normalizer = LexiconNormalizer::from_table("birds\tbird\n");

        let mut seen = Vec::new();
        let summary =
            run(&start, 2, &proposer, &normalizer, &settings(2), |r| seen.push(r.target.clone()))
                .unwrap();

        assert_eq!(seen, vec!["bird", "tree"]);
        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.last_version, dir.path().join("3.txt"));

        let first = &summary.reports[0];
        assert_eq!(first.committed_sentence.as_deref(), Some("I see birds."));
        assert_eq!(first.valid_candidates, 2);

        let second = &summary.reports[1];
        assert_eq!(second.out_of_bounds, vec!["a", "tall"]);
        assert!(second.committed_sentence.is_none());

        assert_eq!(fs::read_to_string(&start).unwrap(), "i\nsee\nbird\ntree\nsky\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("2.txt")).unwrap(),
            "i\t\nsee\t\nbird\tI see birds.\ntree\t\nsky\t\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("3.txt")).unwrap(),
            "i\t\nsee\t\nbird\tI see birds.\na\t\ntall\t\ntree\t\nsky\t\n"
        );
        assert_eq!(*proposer.calls.borrow(), vec!["bird", "tree"]);
    }

    #[test]
    fn test_no_valid_candidate_stops_without_writing() {
        let (dir, start) = setup("cat\ndog\n");
        let proposer = ScriptedProposer::new(vec![Ok(vec!["A cat sat."])]);

        let summary = run(
            &start,
            3,
            &proposer,
            &LexiconNormalizer::surface_forms(),
            &settings(1),
            |_| {},
        )
        .unwrap();

        assert!(summary.reports.is_empty());
        assert!(matches!(summary.stopped_by, Some(NplusError::NoValidCandidate(_))));
        assert_eq!(summary.last_version, start);
        assert!(!dir.path().join("2.txt").exists());
    }

    #[test]
    fn test_retryable_failures_use_extra_attempts() {
        let (_dir, start) = setup("cat\ndog\n");
        let proposer = ScriptedProposer::new(vec![
            Err(NplusError::GenerationFailure("timeout".into())),
            Ok(vec!["A cat sat."]),
            Ok(vec!["A dog."]),
        ]);
        let settings = Settings { skip: 1, max_attempts: 3, ..Settings::default() };

        let summary =
            run(&start, 1, &proposer, &LexiconNormalizer::surface_forms(), &settings, |_| {})
                .unwrap();

        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].out_of_bounds, vec!["a"]);
        assert_eq!(proposer.calls.borrow().len(), 3);
    }

    #[test]
    fn test_normalization_failure_is_fatal() {
        let (dir, start) = setup("cat\ndog\n");
        let proposer = ScriptedProposer::new(vec![Ok(vec!["A dog."])]);

        let err = run(&start, 1, &proposer, &BrokenNormalizer, &settings(1), |_| {}).unwrap_err();

        assert!(matches!(err, NplusError::NormalizationUnavailable(_)));
        assert!(!dir.path().join("2.txt").exists());
    }

    #[test]
    fn test_failed_write_does_not_advance() {
        let (dir, start) = setup("cat\ndog\n");
        fs::write(dir.path().join("2.txt"), "taken\n").unwrap();
        let proposer = ScriptedProposer::new(vec![Ok(vec!["A dog."]), Ok(vec!["A dog."])]);

        let mut reported = 0;
        let err = run(
            &start,
            2,
            &proposer,
            &LexiconNormalizer::surface_forms(),
            &settings(1),
            |_| reported += 1,
        )
        .unwrap_err();

        assert!(matches!(err, NplusError::VersionExists(ref p) if *p == dir.path().join("2.txt")));
        assert_eq!(reported, 0);
        assert_eq!(*proposer.calls.borrow(), vec!["dog"]);
        assert_eq!(fs::read_to_string(dir.path().join("2.txt")).unwrap(), "taken\n");
        assert!(!dir.path().join("3.txt").exists());
    }

    #[test]
    fn test_exhausted_list_ends_run() {
        let (_dir, start) = setup("cat\tA cat.\n");
        let proposer = ScriptedProposer::new(vec![]);

        let summary =
            run(&start, 5, &proposer, &LexiconNormalizer::surface_forms(), &settings(0), |_| {})
                .unwrap();

        assert!(matches!(summary.stopped_by, Some(NplusError::ListExhausted { skip: 0 })));
        assert!(proposer.calls.borrow().is_empty());
    }
}
