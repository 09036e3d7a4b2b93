//! Attempt/eligibility gate.
//!
//! A student identity gets a bounded number of assessment attempts,
//! tracked on the external record store. The gate fails closed: a store
//! failure during lookup or registration denies the attempt rather than
//! letting a transient error mint a fresh "new student".

use std::sync::Arc;

use uuid::Uuid;

use crate::error::EnrollmentError;
use crate::model::{ScoreResult, StudentIdentity, StudentRecord};
use crate::traits::{AssessmentRow, NewStudentRecord, RecordStore};

/// Attempts allowed before the identity is blocked.
pub const MAX_ATTEMPTS: u32 = 3;

/// The gate's answer at registration time.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub student_id: Uuid,
    pub attempt_count: u32,
    pub attempts_remaining: u32,
    pub is_new_student: bool,
    pub blocked: bool,
    pub folder_id: Option<String>,
}

impl GateOutcome {
    fn from_record(record: &StudentRecord, is_new_student: bool) -> Self {
        let blocked = record.attempt_count >= MAX_ATTEMPTS;
        Self {
            student_id: record.student_id,
            attempt_count: record.attempt_count,
            attempts_remaining: MAX_ATTEMPTS.saturating_sub(record.attempt_count),
            is_new_student,
            blocked,
            folder_id: record.folder_id.clone(),
        }
    }
}

/// Cross-step policy limiting assessment attempts per student identity.
pub struct AttemptGate {
    records: Arc<dyn RecordStore>,
}

impl AttemptGate {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Look up the identity, registering it on first contact.
    ///
    /// Returns `blocked = true` when the identity has exhausted its
    /// attempts; the caller must not allow another assessment.
    pub async fn validate_or_register(
        &self,
        identity: &StudentIdentity,
    ) -> Result<GateOutcome, EnrollmentError> {
        let (email, date_of_birth) = identity.dedup_key();

        let existing = self
            .records
            .find_by_identity(&email, date_of_birth)
            .await
            .map_err(|e| {
                // Fail closed: a lookup failure must never become "new
                // student", or transient errors would bypass the limit.
                tracing::warn!("record lookup failed for {email}: {e:#}");
                EnrollmentError::collaborator(e)
            })?;

        if let Some(record) = existing {
            if record.attempt_count >= MAX_ATTEMPTS {
                tracing::info!(
                    student_id = %record.student_id,
                    attempts = record.attempt_count,
                    "registration refused: attempt limit reached"
                );
            }
            return Ok(GateOutcome::from_record(&record, false));
        }

        let created = self
            .records
            .create_record(&NewStudentRecord {
                identity: identity.clone(),
                folder_id: None,
            })
            .await
            .map_err(|e| {
                tracing::warn!("student registration failed for {email}: {e:#}");
                EnrollmentError::collaborator(e)
            })?;

        tracing::info!(student_id = %created.student_id, "registered new student");
        Ok(GateOutcome::from_record(&created, true))
    }

    /// Refuse before scoring when the identity is blocked.
    pub async fn ensure_can_attempt(&self, student_id: Uuid) -> Result<(), EnrollmentError> {
        let record = self
            .records
            .get_record(student_id)
            .await
            .map_err(EnrollmentError::collaborator)?
            .ok_or(EnrollmentError::UnknownSession)?;

        if record.attempt_count >= MAX_ATTEMPTS {
            return Err(EnrollmentError::AttemptLimitExceeded {
                attempt_count: record.attempt_count,
            });
        }
        Ok(())
    }

    /// Consume one attempt for a submitted assessment and log the outcome.
    ///
    /// Both eligible and ineligible outcomes consume an attempt. The
    /// increment happens at the store boundary (the store re-reads the
    /// current count at write time); the new count is returned.
    pub async fn record_submission(
        &self,
        student_id: Uuid,
        identity: &StudentIdentity,
        score: &ScoreResult,
    ) -> Result<u32, EnrollmentError> {
        let new_count = self
            .records
            .increment_attempt(student_id)
            .await
            .map_err(EnrollmentError::collaborator)?;

        let row = AssessmentRow {
            student_id,
            identity: identity.clone(),
            attempt_number: new_count,
            score: score.clone(),
        };
        self.records
            .append_assessment_row(&row)
            .await
            .map_err(EnrollmentError::collaborator)?;

        tracing::info!(
            student_id = %student_id,
            attempt = new_count,
            overall = score.overall,
            eligible = score.eligible,
            "assessment recorded"
        );
        Ok(new_count)
    }

    /// Administrative reset of the attempt count.
    pub async fn reset(&self, student_id: Uuid) -> Result<(), EnrollmentError> {
        self.records
            .reset_attempts(student_id)
            .await
            .map_err(EnrollmentError::collaborator)?;
        tracing::info!(student_id = %student_id, "attempt count reset");
        Ok(())
    }
}
