//! Wizard state machine.
//!
//! The enrollment wizard is a strictly ordered sequence of checkpoints.
//! Every page re-derives what it may show from the draft alone: if a
//! precondition checkpoint is missing the caller is redirected backward to
//! the earliest unmet step, never forward past collected data, and never
//! into fabricated data.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::EnrollmentError;
use crate::model::{
    Background, CourseDetails, Declarations, EnrollmentDraft, PersonalDetails, ScoreResult,
    UploadedDocument,
};

/// Checkpoints written into `EnrollmentDraft.stage`, in required order.
///
/// `NotEligible` is the absorbing branch out of the assessment step; it is
/// not part of the happy-path ordering and its only exit is a retake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStage {
    Start,
    LlnInProgress,
    LlnResults,
    NotEligible,
    PersonalDetailsComplete,
    DeclarationComplete,
    DocumentsCollected,
    EnrollmentComplete,
}

impl WizardStage {
    /// Position on the happy path. `NotEligible` shares the rank of
    /// `LlnResults`: both mean "an assessment outcome exists".
    fn rank(self) -> u8 {
        match self {
            WizardStage::Start => 0,
            WizardStage::LlnInProgress => 1,
            WizardStage::LlnResults | WizardStage::NotEligible => 2,
            WizardStage::PersonalDetailsComplete => 3,
            WizardStage::DeclarationComplete => 4,
            WizardStage::DocumentsCollected => 5,
            WizardStage::EnrollmentComplete => 6,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == WizardStage::EnrollmentComplete
    }
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WizardStage::Start => "start",
            WizardStage::LlnInProgress => "lln-in-progress",
            WizardStage::LlnResults => "lln-results",
            WizardStage::NotEligible => "not-eligible",
            WizardStage::PersonalDetailsComplete => "personal-details-complete",
            WizardStage::DeclarationComplete => "declaration-complete",
            WizardStage::DocumentsCollected => "documents-collected",
            WizardStage::EnrollmentComplete => "enrollment-complete",
        };
        f.write_str(s)
    }
}

impl FromStr for WizardStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(WizardStage::Start),
            "lln-in-progress" => Ok(WizardStage::LlnInProgress),
            "lln-results" => Ok(WizardStage::LlnResults),
            "not-eligible" => Ok(WizardStage::NotEligible),
            "personal-details-complete" => Ok(WizardStage::PersonalDetailsComplete),
            "declaration-complete" => Ok(WizardStage::DeclarationComplete),
            "documents-collected" => Ok(WizardStage::DocumentsCollected),
            "enrollment-complete" => Ok(WizardStage::EnrollmentComplete),
            other => Err(format!("unknown wizard stage: {other}")),
        }
    }
}

/// The earliest step the student still has to act on, derived from the
/// draft's accumulated data. This is the redirect target whenever a page's
/// precondition is unmet.
pub fn next_step(draft: &EnrollmentDraft) -> WizardStage {
    match &draft.score {
        None => WizardStage::LlnInProgress,
        Some(score) if !score.eligible => WizardStage::NotEligible,
        Some(_) => {
            if draft.personal_details.is_none() || draft.course_details.is_none() {
                WizardStage::LlnResults
            } else if draft.compliance.is_none() {
                WizardStage::PersonalDetailsComplete
            } else if draft.documents.is_empty() {
                WizardStage::DeclarationComplete
            } else if draft.stage != WizardStage::EnrollmentComplete {
                WizardStage::DocumentsCollected
            } else {
                WizardStage::EnrollmentComplete
            }
        }
    }
}

/// Check that the draft has reached `required` and carries an eligible
/// score where the required stage lies past the assessment.
pub fn ensure_reached(draft: &EnrollmentDraft, required: WizardStage) -> Result<(), EnrollmentError> {
    if draft.stage.is_terminal() && !required.is_terminal() {
        return Err(EnrollmentError::StaleState {
            redirect_to: WizardStage::EnrollmentComplete,
        });
    }
    let needs_eligible_score = required.rank() >= WizardStage::LlnResults.rank();
    if needs_eligible_score && !draft.score.as_ref().is_some_and(|s| s.eligible) {
        return Err(EnrollmentError::StaleState {
            redirect_to: next_step(draft),
        });
    }
    if draft.stage.rank() < required.rank() {
        return Err(EnrollmentError::StaleState {
            redirect_to: next_step(draft),
        });
    }
    Ok(())
}

/// Advance the checkpoint without ever moving it backward. Returning to an
/// earlier page and resubmitting merges fields but keeps later-step data
/// and the furthest checkpoint intact.
fn advance(draft: &mut EnrollmentDraft, to: WizardStage) {
    if to.rank() > draft.stage.rank() {
        draft.stage = to;
    }
    draft.touch();
}

/// Enter (or re-enter) the assessment step.
pub fn begin_assessment(draft: &mut EnrollmentDraft) -> Result<(), EnrollmentError> {
    if draft.stage.is_terminal() {
        return Err(EnrollmentError::StaleState {
            redirect_to: WizardStage::EnrollmentComplete,
        });
    }
    advance(draft, WizardStage::LlnInProgress);
    Ok(())
}

/// Attach a freshly computed score and branch on eligibility.
///
/// The previous `ScoreResult`, if any, is replaced: eligibility is always
/// recomputed solely from the new score, never blended with a prior
/// attempt.
pub fn attach_score(
    draft: &mut EnrollmentDraft,
    score: ScoreResult,
) -> Result<WizardStage, EnrollmentError> {
    if draft.stage.is_terminal() {
        return Err(EnrollmentError::StaleState {
            redirect_to: WizardStage::EnrollmentComplete,
        });
    }
    let outcome = if score.eligible {
        WizardStage::LlnResults
    } else {
        WizardStage::NotEligible
    };
    draft.score = Some(score);
    // An ineligible outcome must land on the absorbing branch even though
    // its rank does not advance past a previous eligible result.
    draft.stage = outcome;
    draft.touch();
    Ok(outcome)
}

/// Leave the ineligible branch (or the results page) for a fresh attempt,
/// discarding the previous score. Still subject to the attempt gate.
pub fn retake(draft: &mut EnrollmentDraft) -> Result<(), EnrollmentError> {
    match draft.stage {
        WizardStage::NotEligible | WizardStage::LlnResults | WizardStage::LlnInProgress => {
            draft.score = None;
            draft.stage = WizardStage::LlnInProgress;
            draft.touch();
            Ok(())
        }
        WizardStage::EnrollmentComplete => Err(EnrollmentError::StaleState {
            redirect_to: WizardStage::EnrollmentComplete,
        }),
        _ => Err(EnrollmentError::validation(
            "the assessment cannot be retaken after enrollment details have been submitted",
        )),
    }
}

/// Submission payload for the personal-details page.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonalDetailsSubmission {
    pub personal_details: PersonalDetails,
    pub course_details: CourseDetails,
    #[serde(default)]
    pub background: Option<Background>,
}

pub fn submit_personal_details(
    draft: &mut EnrollmentDraft,
    submission: PersonalDetailsSubmission,
) -> Result<(), EnrollmentError> {
    ensure_reached(draft, WizardStage::LlnResults)?;

    let mut issues = Vec::new();
    let details = &submission.personal_details;
    require(&mut issues, "street_address", &details.street_address);
    require(&mut issues, "suburb", &details.suburb);
    require(&mut issues, "state", &details.state);
    require(&mut issues, "postcode", &details.postcode);
    require(&mut issues, "phone", &details.phone);
    require(
        &mut issues,
        "emergency_contact_name",
        &details.emergency_contact_name,
    );
    require(
        &mut issues,
        "emergency_contact_phone",
        &details.emergency_contact_phone,
    );
    require(&mut issues, "course_code", &submission.course_details.course_code);
    require(&mut issues, "course_name", &submission.course_details.course_name);
    if !issues.is_empty() {
        return Err(EnrollmentError::Validation { issues });
    }

    draft.personal_details = Some(submission.personal_details);
    draft.course_details = Some(submission.course_details);
    if let Some(background) = submission.background {
        draft.background = Some(background);
    }
    advance(draft, WizardStage::PersonalDetailsComplete);
    Ok(())
}

/// Submission payload for the declarations page.
#[derive(Debug, Clone, Deserialize)]
pub struct DeclarationSubmission {
    pub privacy_consent: bool,
    pub information_accurate: bool,
    pub fees_acknowledged: bool,
    pub signature_name: String,
}

pub fn submit_declaration(
    draft: &mut EnrollmentDraft,
    submission: DeclarationSubmission,
) -> Result<(), EnrollmentError> {
    ensure_reached(draft, WizardStage::PersonalDetailsComplete)?;

    let mut issues = Vec::new();
    if !submission.privacy_consent {
        issues.push("the privacy consent must be accepted".into());
    }
    if !submission.information_accurate {
        issues.push("the accuracy declaration must be accepted".into());
    }
    if !submission.fees_acknowledged {
        issues.push("the fee schedule must be acknowledged".into());
    }
    require(&mut issues, "signature_name", &submission.signature_name);
    if !issues.is_empty() {
        return Err(EnrollmentError::Validation { issues });
    }

    draft.compliance = Some(Declarations {
        privacy_consent: submission.privacy_consent,
        information_accurate: submission.information_accurate,
        fees_acknowledged: submission.fees_acknowledged,
        signature_name: submission.signature_name.trim().to_string(),
        declared_at: Utc::now(),
    });
    advance(draft, WizardStage::DeclarationComplete);
    Ok(())
}

/// Record uploaded documents and advance to the collected checkpoint.
pub fn add_documents(
    draft: &mut EnrollmentDraft,
    documents: Vec<UploadedDocument>,
) -> Result<(), EnrollmentError> {
    ensure_reached(draft, WizardStage::DeclarationComplete)?;
    if documents.is_empty() {
        return Err(EnrollmentError::validation(
            "at least one document must be uploaded",
        ));
    }
    draft.documents.extend(documents);
    advance(draft, WizardStage::DocumentsCollected);
    Ok(())
}

/// Enter the terminal state. Re-entry redisplays a summary; no further
/// forward or backward transitions are permitted on this draft.
pub fn complete(draft: &mut EnrollmentDraft) -> Result<(), EnrollmentError> {
    if draft.stage.is_terminal() {
        return Ok(());
    }
    ensure_reached(draft, WizardStage::DocumentsCollected)?;
    advance(draft, WizardStage::EnrollmentComplete);
    Ok(())
}

fn require(issues: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        issues.push(format!("{field} is required"));
    }
}
