//! Analysis session state machine
//!
//! One session covers one user-driven attempt to review a file: pick a file,
//! submit it, wait, then show the review or the error. The UI mutates the
//! session only through the transition methods below; illegal combinations
//! such as "loading with an error showing" cannot be represented.
//!
//! The request itself runs as a spawned task. Every submission is tagged with
//! the session generation that issued it, and `reset`/`select_file` bump the
//! generation, so a response that arrives after the user moved on is dropped
//! instead of overwriting newer state.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::Analyzer;
use crate::error::Error;
use crate::review::{ReviewRecord, SelectedFile};

/// Where the session currently is. Every state past `Idle` carries the file it
/// is about.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Ready {
        file: Arc<SelectedFile>,
    },
    Pending {
        file: Arc<SelectedFile>,
    },
    Succeeded {
        file: Arc<SelectedFile>,
        record: Arc<ReviewRecord>,
    },
    Failed {
        file: Arc<SelectedFile>,
        message: String,
    },
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Ready { .. } => "ready",
            SessionState::Pending { .. } => "pending",
            SessionState::Succeeded { .. } => "succeeded",
            SessionState::Failed { .. } => "failed",
        }
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        match self {
            SessionState::Idle => None,
            SessionState::Ready { file }
            | SessionState::Pending { file }
            | SessionState::Succeeded { file, .. }
            | SessionState::Failed { file, .. } => Some(file.as_ref()),
        }
    }

    pub fn record(&self) -> Option<&ReviewRecord> {
        match self {
            SessionState::Succeeded { record, .. } => Some(record.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SessionState::Failed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::Pending { .. })
    }
}

/// A request the caller must hand to the analyzer, exactly once.
#[derive(Debug, Clone)]
pub struct Submission {
    pub generation: u64,
    pub file: Arc<SelectedFile>,
}

/// The outcome of a submission, tagged with the generation that issued it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub generation: u64,
    pub result: Result<ReviewRecord, Error>,
}

/// What `Session::complete` did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    /// The session moved on (reset or new file) before the response arrived.
    Stale,
}

#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Select a file from any state. Drops any review, error or in-flight
    /// request belonging to the previous file.
    pub fn select_file(&mut self, file: SelectedFile) {
        self.generation += 1;
        debug!(
            from = self.state.label(),
            file = %file.name,
            generation = self.generation,
            "file selected"
        );
        self.state = SessionState::Ready {
            file: Arc::new(file),
        };
    }

    /// Move `Ready` to `Pending` and hand back the request to run.
    pub fn submit(&mut self) -> Result<Submission, Error> {
        match std::mem::take(&mut self.state) {
            SessionState::Ready { file } => {
                info!(file = %file.name, generation = self.generation, "submitting for analysis");
                self.state = SessionState::Pending {
                    file: Arc::clone(&file),
                };
                Ok(Submission {
                    generation: self.generation,
                    file,
                })
            }
            SessionState::Idle => Err(Error::Validation(
                "Please select a code file first.".to_string(),
            )),
            other => {
                let state = other.label();
                debug!(state, "ignoring submit");
                self.state = other;
                Err(Error::InvalidState {
                    state,
                    event: "submit",
                })
            }
        }
    }

    /// Apply a finished request, unless it belongs to an older generation or
    /// the session is no longer waiting for it.
    pub fn complete(&mut self, completion: Completion) -> Resolution {
        if completion.generation != self.generation || !self.state.is_pending() {
            debug!(
                response_generation = completion.generation,
                generation = self.generation,
                state = self.state.label(),
                "discarding stale analysis response"
            );
            return Resolution::Stale;
        }

        let file = match std::mem::take(&mut self.state) {
            SessionState::Pending { file } => file,
            // is_pending() was checked above
            other => {
                self.state = other;
                return Resolution::Stale;
            }
        };

        self.state = match completion.result {
            Ok(record) => {
                info!(file = %file.name, score = record.score, "analysis succeeded");
                SessionState::Succeeded {
                    file,
                    record: Arc::new(record),
                }
            }
            Err(err) => {
                match &err {
                    Error::MalformedResponse(cause) => {
                        warn!(file = %file.name, %cause, "malformed analysis response")
                    }
                    _ => warn!(file = %file.name, error = %err, "analysis failed"),
                }
                SessionState::Failed {
                    file,
                    message: err.to_string(),
                }
            }
        };
        Resolution::Applied
    }

    /// Go back from `Failed` to `Ready` with the same file.
    pub fn retry(&mut self) -> Result<(), Error> {
        match std::mem::take(&mut self.state) {
            SessionState::Failed { file, .. } => {
                debug!(file = %file.name, "retrying same file");
                self.state = SessionState::Ready { file };
                Ok(())
            }
            other => {
                let state = other.label();
                self.state = other;
                Err(Error::InvalidState {
                    state,
                    event: "retry",
                })
            }
        }
    }

    /// Forget everything. Any in-flight response becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        debug!(from = self.state.label(), generation = self.generation, "session reset");
        self.state = SessionState::Idle;
    }
}

/// Run a submission on the tokio runtime.
///
/// The handle resolves to a `Completion` to feed back into
/// [`Session::complete`].
pub fn spawn_analysis<A: Analyzer>(analyzer: Arc<A>, submission: Submission) -> JoinHandle<Completion> {
    tokio::spawn(async move {
        let result = analyzer.analyze(&submission.file).await;
        Completion {
            generation: submission.generation,
            result,
        }
    })
}
