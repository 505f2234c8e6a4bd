// src/error.rs
use crate::codec::FormatError;
use crate::models::{ValidationError, WorkoutId};
use serde::Deserialize;
use thiserror::Error;

/// Anything that went wrong on the far side of a remote call. Transport
/// details are folded into a message a person can read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Request timeout - please try again")]
    Timeout,
    #[error("Network error - please check if the server is running")]
    Network,
    #[error("This workout already exists for today. Please add a different workout.")]
    Duplicate,
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

// Error bodies come back as either `{ "message": .. }` or `{ "error": .. }`.
#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl RemoteError {
    /// Maps a non-success HTTP status and its raw body to a readable error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let mentions_duplicate = [&parsed.message, &parsed.error]
            .iter()
            .filter_map(|m| m.as_deref())
            .any(|m| m.to_lowercase().contains("duplicate"));

        if status == 409 || mentions_duplicate {
            return RemoteError::Duplicate;
        }

        let message = parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "An error occurred. Please try again.".to_string());
        RemoteError::Server { status, message }
    }
}

/// Why an `add` did not land in the snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Please follow the workout format (#Category, -Name, -Sets/Reps, -Weight, -Duration): {0}")]
    Format(#[from] FormatError),
    #[error("This workout already exists for today. Please add a different workout or modify the existing one.")]
    Duplicate,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Local preconditions for edit/remove. None of these reach the network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Workout entry not found: ID {0}")]
    UnknownWorkout(WorkoutId),
    #[error("Workout {0} already has a change in flight")]
    MutationPending(WorkoutId),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A fetch that resolved after a newer one was issued. Internal only.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("fetch #{token} superseded by #{current}")]
pub struct StaleResult {
    pub token: u64,
    pub current: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_and_duplicate_bodies_normalize_to_duplicate() {
        assert_eq!(RemoteError::from_status(409, ""), RemoteError::Duplicate);
        assert_eq!(
            RemoteError::from_status(400, r#"{"message":"E11000 Duplicate key error"}"#),
            RemoteError::Duplicate
        );
        assert_eq!(
            RemoteError::from_status(500, r#"{"error":"duplicate workout"}"#),
            RemoteError::Duplicate
        );
        assert_eq!(
            RemoteError::Duplicate.to_string(),
            "This workout already exists for today. Please add a different workout."
        );
    }

    #[test]
    fn server_message_is_preferred_over_generic_text() {
        let err = RemoteError::from_status(404, r#"{"message":"Workout not found"}"#);
        assert_eq!(err.to_string(), "Workout not found");

        let err = RemoteError::from_status(500, "<html>oops</html>");
        assert_eq!(err.to_string(), "An error occurred. Please try again.");
    }
}
