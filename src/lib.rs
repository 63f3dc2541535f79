pub mod cli;
pub mod core;
pub mod dictionary;
pub mod generation;
pub mod ladder;
pub mod persistence;
pub mod segmentation;
pub mod tools;

pub use crate::core::{
    NplusError,
    StepReport,
};
pub use ladder::{
    LadderState,
    VocabularyList,
};
