//! # Error Hierarchy
//!
//! Structured errors for the credential lifecycle, built with `thiserror`.
//!
//! Parsing and construction errors abort the pipeline. Issuance errors are
//! normally captured as data on a failed issuance result, so
//! [`CredGuardError::IssuanceFailed`] only surfaces when no result could be
//! produced at all. Verification never produces an error of this type.

use thiserror::Error;

/// Top-level error type for the credential lifecycle pipeline.
#[derive(Error, Debug)]
pub enum CredGuardError {
    /// Malformed or empty caller input. Surfaced immediately, never retried.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The vision collaborator failed or returned an unparseable response.
    #[error("extraction failed for {file_name}: {reason}")]
    ExtractionFailed {
        /// Name of the uploaded file.
        file_name: String,
        /// What went wrong.
        reason: String,
    },

    /// The issuance pipeline aborted before it could produce a result.
    #[error("issuance failed: {reason}")]
    IssuanceFailed {
        /// Human-readable summary.
        reason: String,
        /// The stage error that caused the abort, if any.
        #[source]
        cause: Option<Box<CredGuardError>>,
    },

    /// Revocation hit an unexpected error (transport, malformed response).
    ///
    /// An agent that explicitly rejects the revocation is not an error; the
    /// orchestrator reports that as `Ok(false)`.
    #[error("revocation of {credential_id} failed: {reason}")]
    RevocationFailed {
        /// The credential that was being revoked.
        credential_id: String,
        /// What went wrong.
        reason: String,
    },

    /// Required external credentials are missing outside mock mode.
    #[error("configuration invalid: {0}")]
    ConfigurationInvalid(String),

    /// A lifecycle state machine rejected a transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl CredGuardError {
    /// Wrap a stage error as an [`CredGuardError::IssuanceFailed`] abort.
    pub fn issuance_aborted(reason: impl Into<String>, cause: CredGuardError) -> Self {
        Self::IssuanceFailed {
            reason: reason.into(),
            cause: Some(Box::new(cause)),
        }
    }
}

/// Errors raised by the document and credential state machines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The attempted transition is not an edge of the state machine.
    #[error("invalid {machine} transition from {from} to {to}")]
    InvalidTransition {
        /// Which lifecycle rejected the transition.
        machine: &'static str,
        /// The current state.
        from: &'static str,
        /// The attempted target state.
        to: &'static str,
    },

    /// The entity is already in a terminal state.
    #[error("{machine} is already in terminal state {state}")]
    AlreadyTerminal {
        /// Which lifecycle rejected the transition.
        machine: &'static str,
        /// The terminal state.
        state: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn issuance_aborted_keeps_the_stage_error_as_source() {
        let err = CredGuardError::issuance_aborted(
            "Failed to issue credential from document",
            CredGuardError::InvalidInput("file bytes must not be empty".into()),
        );
        assert!(err.to_string().contains("Failed to issue credential"));
        let source = err.source().expect("source must be set");
        assert!(source.to_string().contains("file bytes must not be empty"));
    }

    #[test]
    fn transition_error_display() {
        let err = TransitionError::InvalidTransition {
            machine: "issuance",
            from: "REVOKED",
            to: "ISSUED",
        };
        assert_eq!(
            err.to_string(),
            "invalid issuance transition from REVOKED to ISSUED"
        );
    }

    #[test]
    fn transition_converts_into_top_level_error() {
        let err: CredGuardError = TransitionError::AlreadyTerminal {
            machine: "document",
            state: "FAILED",
        }
        .into();
        assert!(matches!(err, CredGuardError::Transition(_)));
        assert_eq!(err.to_string(), "document is already in terminal state FAILED");
    }
}
