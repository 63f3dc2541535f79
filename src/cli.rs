//! Command-line surface for nplusone

use std::path::PathBuf;

use clap::{
    Args,
    Parser,
    Subcommand,
};
use tracing::{
    error,
    info,
};

use crate::{
    core::{
        pipeline::{
            self,
            RunSummary,
        },
        NplusError,
        StepReport,
    },
    generation::OpenAiProposer,
    ladder::{
        evaluator::TieBreak,
        version_file::read_list,
        LadderState,
    },
    persistence::Settings,
    segmentation::normalizer_for,
    tools,
};

#[derive(Parser)]
#[command(name = "nplusone")]
#[command(about = "Grow a frequency-ordered vocabulary list into an n+1 sentence ladder", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run generation steps, writing one new version file per step
    Run {
        /// Version file to start from (e.g. 1.txt)
        #[arg(short, long)]
        file: PathBuf,
        /// Number of steps to run
        #[arg(short = 'n', long, default_value = "1")]
        steps: usize,
        #[command(flatten)]
        overrides: SettingsOverrides,
        #[command(flatten)]
        lexicon: LexiconArgs,
        /// Print step reports as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Show cursor position and progress of a version file
    Status {
        #[arg(short, long)]
        file: PathBuf,
        /// Base vocabulary size
        #[arg(long)]
        skip: Option<usize>,
    },
    /// Remove repeated lemmas from a list, keeping the first occurrence
    Dedup {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Lemmatize a sentence file into `sentence<TAB>lemmas` lines
    Lemmatize {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Language code
        #[arg(long)]
        lang: Option<String>,
        #[command(flatten)]
        lexicon: LexiconArgs,
        /// Skip lines already present in the output and append the rest
        #[arg(long = "continue")]
        resume: bool,
    },
    /// Print effective settings
    Config {
        #[command(flatten)]
        overrides: SettingsOverrides,
        /// Persist the merged settings
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug, Default)]
struct SettingsOverrides {
    /// Base vocabulary size (entries never targeted)
    #[arg(long)]
    skip: Option<usize>,
    /// Language code
    #[arg(long)]
    lang: Option<String>,
    /// Generation model name
    #[arg(long)]
    model: Option<String>,
    /// Sentences requested per step
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long)]
    min_words: Option<usize>,
    #[arg(long)]
    max_words: Option<usize>,
    /// Ordering among equally good candidates
    #[arg(long, value_enum)]
    tie_break: Option<TieBreak>,
    /// Attempts per step before the run stops
    #[arg(long)]
    max_attempts: Option<usize>,
}

impl SettingsOverrides {
    fn apply(self, mut settings: Settings) -> Settings {
        if let Some(skip) = self.skip {
            settings.skip = skip;
        }
        if let Some(lang) = self.lang {
            settings.language = lang;
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(min_words) = self.min_words {
            settings.min_words = min_words;
        }
        if let Some(max_words) = self.max_words {
            settings.max_words = max_words;
        }
        if let Some(tie_break) = self.tie_break {
            settings.tie_break = tie_break;
        }
        if let Some(max_attempts) = self.max_attempts {
            settings.max_attempts = max_attempts;
        }
        settings
    }
}

#[derive(Args, Debug, Default)]
struct LexiconArgs {
    /// form<TAB>lemma table (defaults to the data directory copy)
    #[arg(long)]
    lexicon: Option<PathBuf>,
    /// Use lower-cased surface forms instead of a lexicon
    #[arg(long)]
    surface_forms: bool,
}

pub fn run() -> Result<(), NplusError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, steps, overrides, lexicon, json } => {
            let settings = overrides.apply(Settings::load());
            settings.validate()?;

            let normalizer =
                normalizer_for(&settings.language, lexicon.lexicon.as_deref(), lexicon.surface_forms)?;
            let proposer = OpenAiProposer::from_settings(&settings)?;

            let summary = pipeline::run(&file, steps, &proposer, normalizer.as_ref(), &settings, |report| {
                print_report(report, json)
            })?;

            finish_run(summary)?;
        }
        Commands::Status { file, skip } => {
            let skip = skip.unwrap_or_else(|| Settings::load().skip);
            let state = LadderState::new(read_list(&file)?, skip)?;
            println!("File: {}", file.display());
            println!("  Entries: {}", state.list.len());
            println!("  Base vocabulary: {}", state.skip.min(state.list.len()));
            println!("  Sentences committed: {}", state.committed_count());
            match state.target() {
                Ok((cursor, entry)) => {
                    println!("  Cursor: {}", cursor);
                    println!("  Next lemma: {}", entry.lemma);
                }
                Err(_) => println!("  Cursor: end of list"),
            }
        }
        Commands::Dedup { input, output } => {
            let outcome = tools::dedup_file(&input, &output)?;
            for lemma in &outcome.repeated {
                println!("{}", lemma);
            }
            println!("Kept {} lemmas, removed {} repeats", outcome.lines.len(), outcome.repeated.len());
        }
        Commands::Lemmatize { input, output, lang, lexicon, resume } => {
            let language = lang.unwrap_or_else(|| Settings::load().language);
            let normalizer =
                normalizer_for(&language, lexicon.lexicon.as_deref(), lexicon.surface_forms)?;
            let summary = tools::lemmatize_file(&input, &output, normalizer.as_ref(), resume)?;
            println!("Lemmatized {} lines ({} already done)", summary.written, summary.skipped);
        }
        Commands::Config { overrides, save } => {
            let settings = overrides.apply(Settings::load());
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if save {
                let path = settings.save()?;
                println!("Saved to {}", path.display());
            }
        }
    }

    Ok(())
}

/// Reaching the end of the list is a normal finish; any other early stop is
/// handed back so the process exits non-zero.
fn finish_run(summary: RunSummary) -> Result<(), NplusError> {
    info!(
        steps = summary.reports.len(),
        last = %summary.last_version.display(),
        "latest version"
    );
    match summary.stopped_by {
        None | Some(NplusError::ListExhausted { .. }) => Ok(()),
        Some(reason) => Err(reason),
    }
}

fn print_report(report: &StepReport, json: bool) {
    if json {
        match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(e) => error!(error = %e, "failed to serialize step report"),
        }
    } else {
        print!("{}", report.render());
    }
}
