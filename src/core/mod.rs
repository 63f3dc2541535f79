pub mod errors;
pub mod http;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use errors::NplusError;
pub use models::{
    lemma_key,
    Candidate,
    Entry,
    StepReport,
};
