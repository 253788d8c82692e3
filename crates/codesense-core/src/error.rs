use thiserror::Error;

/// Everything that can go wrong during one analysis session.
///
/// None of these are fatal: the session always ends up somewhere the user can
/// act from (`Ready`, `Failed`, or `Idle` after a reset).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The user asked for something the current input can't satisfy,
    /// e.g. analyze with no file selected.
    #[error("{0}")]
    Validation(String),

    /// An event arrived in a state that doesn't accept it (double submit).
    #[error("cannot {event} while the session is {state}")]
    InvalidState {
        state: &'static str,
        event: &'static str,
    },

    /// Network failure or a non-success answer from the analysis service.
    #[error("{0}")]
    Transport(String),

    /// The service answered successfully but the body isn't a review.
    #[error("the analysis service returned an unusable review: {0}")]
    MalformedResponse(String),
}

impl Error {
    /// Errors that move the session into `Failed`.
    pub fn is_analysis_failure(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::MalformedResponse(_))
    }
}
