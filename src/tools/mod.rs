pub mod dedup;
pub mod lemmatize;

pub use dedup::{
    dedup_file,
    DedupOutcome,
};
pub use lemmatize::{
    lemmatize_file,
    LemmatizeSummary,
};
