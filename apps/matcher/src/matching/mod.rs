//! Resume vs job-description matching.
//!
//! Stages, leaves first: extractor -> sections -> experience, entities,
//! normalizer -> scoring. `pipeline` wires them together; `handlers` is the
//! HTTP boundary.

pub mod entities;
pub mod error;
pub mod experience;
pub mod extractor;
pub mod handlers;
pub mod normalizer;
pub mod pipeline;
pub mod scoring;
pub mod sections;

pub use error::MatchError;
pub use extractor::DocumentSource;
pub use pipeline::{MatchPipeline, MatchResult};
