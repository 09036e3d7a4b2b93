//! Enrollment error taxonomy.
//!
//! Every error here returns control to the student with an explicit next
//! action; none is fatal to the process. Defined in `intake-core` so the
//! server and CLI can map variants to responses without string matching.

use thiserror::Error;

use crate::wizard::WizardStage;

/// Errors produced by the wizard, gate, and submission validation.
#[derive(Debug, Error)]
pub enum EnrollmentError {
    /// Malformed or missing required input. Resolved locally by
    /// re-prompting; nothing is partially persisted.
    #[error("invalid submission: {}", issues.join("; "))]
    Validation { issues: Vec<String> },

    /// The identity has used all assessment attempts. Terminal until an
    /// administrator resets the count.
    #[error(
        "the assessment attempt limit has been reached; \
         contact student support to have your attempts reviewed"
    )]
    AttemptLimitExceeded { attempt_count: u32 },

    /// A record or document store call failed. Surfaced as a generic
    /// retry-later condition; the wizard step is not advanced.
    #[error("a backing service is unavailable, please try again later")]
    CollaboratorUnavailable { detail: String },

    /// A step was requested before its precondition checkpoint was met.
    /// Resolved by redirecting to the earliest valid step, never by
    /// fabricating missing data.
    #[error("this step is not available yet; continue from '{redirect_to}'")]
    StaleState { redirect_to: WizardStage },

    /// No draft exists for the presented session id.
    #[error("unknown enrollment session")]
    UnknownSession,
}

impl EnrollmentError {
    /// Single-issue validation error.
    pub fn validation(issue: impl Into<String>) -> Self {
        EnrollmentError::Validation {
            issues: vec![issue.into()],
        }
    }

    /// Wrap a collaborator failure, keeping the detail for logs only.
    pub fn collaborator(err: impl std::fmt::Display) -> Self {
        EnrollmentError::CollaboratorUnavailable {
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_joins_issues() {
        let err = EnrollmentError::Validation {
            issues: vec!["phone is required".into(), "postcode is required".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("phone is required"));
        assert!(msg.contains("postcode is required"));
    }

    #[test]
    fn collaborator_message_hides_detail() {
        let err = EnrollmentError::collaborator("HTTP 500 from sheets");
        assert!(!err.to_string().contains("500"));
        match err {
            EnrollmentError::CollaboratorUnavailable { detail } => {
                assert!(detail.contains("500"));
            }
            _ => panic!("wrong variant"),
        }
    }
}
