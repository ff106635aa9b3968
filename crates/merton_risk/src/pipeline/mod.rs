//! Batch pipeline over panels of entities.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌────────────────────────────────────┐   ┌────────────┐
//! │  InputSource  │──▶│           MertonPipeline           │──▶│ ResultSink │
//! │ (per entity)  │   │ solve_batch → annotate → OutputRow │   │ (replace)  │
//! └───────────────┘   │          → ValidationReport        │   └────────────┘
//!                     └────────────────────────────────────┘
//! ```
//!
//! Entities fan out on the Rayon pool and each one yields its own
//! `Result<EntityReport, PipelineError>`.

mod error;
mod io;
mod orchestrator;
mod output;

pub use error::PipelineError;
pub use io::{BoxError, InMemorySink, InMemorySource, InputSource, ResultSink};
pub use orchestrator::{BatchReport, EntityReport, MertonPipeline, PipelineConfig};
pub use output::{OutputRow, ValidationReport};
