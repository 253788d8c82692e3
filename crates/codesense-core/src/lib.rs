//! Core library for CodeSense
//!
//! Everything here is UI-agnostic: the analysis session state machine, the HTTP
//! client for the review service, and the report/export pipeline. The TUI and
//! headless CLI in the root crate are thin shells over these types.

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod normalize;
pub mod report;
pub mod review;
pub mod session;

// Re-export main types for convenience
pub use client::{Analyzer, ReviewClient};
pub use config::Config;
pub use error::Error;
pub use export::{ExportLayout, ExportSection};
pub use normalize::{normalize, Mode};
pub use report::{classify, Report, ReportSection, ScoreBand};
pub use review::{ReviewRecord, SelectedFile};
pub use session::{spawn_analysis, Completion, Resolution, Session, SessionState, Submission};
