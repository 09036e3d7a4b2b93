//! Wizard endpoints: the public enrollment surface.
//!
//! Each handler reads the draft for the presented session, checks the
//! stage precondition, and hands the actual transition to `intake-core`.
//! A failed store call leaves the draft exactly where it was.

use axum::extract::{Multipart, Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use intake_core::error::EnrollmentError;
use intake_core::gate::MAX_ATTEMPTS;
use intake_core::model::{
    Answer, EnrollmentDraft, ResponseSet, ScoreResult, StudentIdentity, UploadedDocument,
};
use intake_core::scoring;
use intake_core::wizard::{self, DeclarationSubmission, PersonalDetailsSubmission, WizardStage};

use crate::error::ApiError;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: chrono::NaiveDate,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub is_new_student: bool,
    pub attempts_remaining: u32,
    pub next: WizardStage,
}

pub async fn start(
    State(state): State<SharedState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let mut issues = Vec::new();
    if request.first_name.trim().is_empty() {
        issues.push("first_name is required".to_string());
    }
    if request.last_name.trim().is_empty() {
        issues.push("last_name is required".to_string());
    }
    if !request.email.contains('@') {
        issues.push("email is not valid".to_string());
    }
    if !issues.is_empty() {
        return Err(EnrollmentError::Validation { issues }.into());
    }

    let identity = StudentIdentity {
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        email: request.email.trim().to_string(),
        date_of_birth: request.date_of_birth,
    };

    let outcome = state.gate.validate_or_register(&identity).await?;
    if outcome.blocked {
        return Err(EnrollmentError::AttemptLimitExceeded {
            attempt_count: outcome.attempt_count,
        }
        .into());
    }

    let session_id = Uuid::new_v4();
    let mut draft = EnrollmentDraft::new(session_id, outcome.student_id, identity);
    wizard::begin_assessment(&mut draft)?;
    state.insert_session(draft).await;

    Ok(Json(StartResponse {
        session_id,
        student_id: outcome.student_id,
        is_new_student: outcome.is_new_student,
        attempts_remaining: outcome.attempts_remaining,
        next: WizardStage::LlnInProgress,
    }))
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub stage: WizardStage,
    pub next: WizardStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreResult>,
    pub documents_uploaded: usize,
    pub is_terminal: bool,
}

pub async fn status(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let draft = state.session(session_id).await?;
    Ok(Json(StatusResponse {
        session_id,
        student_id: draft.student_id,
        stage: draft.stage,
        next: wizard::next_step(&draft),
        score: draft.score.clone(),
        documents_uploaded: draft.documents.len(),
        is_terminal: draft.stage.is_terminal(),
    }))
}

// ---------------------------------------------------------------------------
// questions
// ---------------------------------------------------------------------------

/// A question as shown to the student, with expected answers stripped.
#[derive(Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub section: intake_core::model::Section,
    pub section_title: &'static str,
    pub prompt: String,
    pub required: bool,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct QuestionsResponse {
    pub bank_id: String,
    pub questions: Vec<PublicQuestion>,
}

pub async fn questions(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    // Sessions only; the bank is not served anonymously.
    state.session(session_id).await?;

    use intake_core::model::ResponseKind;
    let questions = state
        .bank
        .questions()
        .iter()
        .map(|q| PublicQuestion {
            id: q.id.clone(),
            section: q.section,
            section_title: q.section.title(),
            prompt: q.prompt.clone(),
            required: q.required,
            kind: match &q.kind {
                ResponseKind::Text { .. } => "text",
                ResponseKind::Number { .. } => "number",
                ResponseKind::Email => "email",
                ResponseKind::SingleChoice { .. } => "single_choice",
                ResponseKind::MultiChoice { .. } => "multi_choice",
            },
            options: q.kind.options().map(<[String]>::to_vec),
        })
        .collect();

    Ok(Json(QuestionsResponse {
        bank_id: state.bank.id.clone(),
        questions,
    }))
}

// ---------------------------------------------------------------------------
// assessment
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AssessmentSubmission {
    pub responses: ResponseSet,
}

#[derive(Serialize)]
pub struct AssessmentResponse {
    pub score: ScoreResult,
    pub attempt_number: u32,
    pub attempts_remaining: u32,
    pub next: WizardStage,
}

pub async fn submit_assessment(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(submission): Json<AssessmentSubmission>,
) -> Result<Json<AssessmentResponse>, ApiError> {
    let draft = state.session(session_id).await?;
    if draft.stage.is_terminal() {
        return Err(EnrollmentError::StaleState {
            redirect_to: WizardStage::EnrollmentComplete,
        }
        .into());
    }

    // A blocked identity is refused before scoring even runs.
    state.gate.ensure_can_attempt(draft.student_id).await?;

    let missing: Vec<String> = state
        .bank
        .questions()
        .iter()
        .filter(|q| {
            q.required
                && submission
                    .responses
                    .answer(&q.id)
                    .is_none_or(Answer::is_blank)
        })
        .map(|q| format!("question '{}' requires an answer", q.id))
        .collect();
    if !missing.is_empty() {
        return Err(EnrollmentError::Validation { issues: missing }.into());
    }

    let score = scoring::score(&state.bank, &submission.responses);

    // The attempt is consumed whatever the outcome; if the store is down
    // the draft is left untouched and the student retries later.
    let attempt_number = state
        .gate
        .record_submission(draft.student_id, &draft.identity, &score)
        .await?;

    let next = state
        .update_session(session_id, |d| wizard::attach_score(d, score.clone()))
        .await?;

    Ok(Json(AssessmentResponse {
        score,
        attempt_number,
        attempts_remaining: MAX_ATTEMPTS.saturating_sub(attempt_number),
        next,
    }))
}

// ---------------------------------------------------------------------------
// retake
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct RetakeResponse {
    pub next: WizardStage,
    pub attempts_remaining: u32,
}

pub async fn retake(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<RetakeResponse>, ApiError> {
    let draft = state.session(session_id).await?;
    state.gate.ensure_can_attempt(draft.student_id).await?;
    state.update_session(session_id, wizard::retake).await?;

    let record = state
        .records
        .get_record(draft.student_id)
        .await
        .map_err(EnrollmentError::collaborator)?;
    let attempts_remaining = record
        .map(|r| MAX_ATTEMPTS.saturating_sub(r.attempt_count))
        .unwrap_or(0);

    Ok(Json(RetakeResponse {
        next: WizardStage::LlnInProgress,
        attempts_remaining,
    }))
}

// ---------------------------------------------------------------------------
// personal details / declaration
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StepResponse {
    pub stage: WizardStage,
    pub next: WizardStage,
}

pub async fn submit_personal_details(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(submission): Json<PersonalDetailsSubmission>,
) -> Result<Json<StepResponse>, ApiError> {
    let draft = state
        .update_session(session_id, |d| {
            wizard::submit_personal_details(d, submission)?;
            Ok(d.clone())
        })
        .await?;
    Ok(Json(StepResponse {
        stage: draft.stage,
        next: wizard::next_step(&draft),
    }))
}

pub async fn submit_declaration(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    Json(submission): Json<DeclarationSubmission>,
) -> Result<Json<StepResponse>, ApiError> {
    let draft = state
        .update_session(session_id, |d| {
            wizard::submit_declaration(d, submission)?;
            Ok(d.clone())
        })
        .await?;
    Ok(Json(StepResponse {
        stage: draft.stage,
        next: wizard::next_step(&draft),
    }))
}

// ---------------------------------------------------------------------------
// documents
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct DocumentsResponse {
    pub stage: WizardStage,
    pub next: WizardStage,
    pub uploaded: Vec<String>,
}

pub async fn upload_documents(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let draft = state.session(session_id).await?;
    // Check the precondition before any bytes are uploaded.
    wizard::ensure_reached(&draft, WizardStage::DeclarationComplete)?;

    let folder_id = state
        .documents
        .ensure_folder(draft.student_id, &draft.identity.full_name())
        .await
        .map_err(EnrollmentError::collaborator)?;
    if let Err(e) = state.records.set_folder(draft.student_id, &folder_id).await {
        // The folder is re-derived on demand; losing the back-reference
        // is not worth failing the upload.
        tracing::warn!("failed to record folder id: {e:#}");
    }

    let mut uploaded = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| EnrollmentError::validation(format!("malformed upload: {e}")))?
    {
        let category = field.name().map(str::to_string);
        let name = field
            .file_name()
            .map(str::to_string)
            .or_else(|| category.clone())
            .unwrap_or_else(|| "document".to_string());
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| EnrollmentError::validation(format!("malformed upload: {e}")))?
            .to_vec();
        if bytes.is_empty() {
            continue;
        }

        let url = state
            .documents
            .upload_file(&folder_id, &name, bytes, &mime_type, None)
            .await
            .map_err(EnrollmentError::collaborator)?;
        uploaded.push(UploadedDocument {
            name,
            mime_type,
            url,
            category,
            uploaded_at: Utc::now(),
        });
    }

    let names: Vec<String> = uploaded.iter().map(|d| d.name.clone()).collect();
    let draft = state
        .update_session(session_id, |d| {
            wizard::add_documents(d, uploaded)?;
            Ok(d.clone())
        })
        .await?;

    Ok(Json(DocumentsResponse {
        stage: draft.stage,
        next: wizard::next_step(&draft),
        uploaded: names,
    }))
}

// ---------------------------------------------------------------------------
// complete
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CompleteResponse {
    pub stage: WizardStage,
    pub student_id: Uuid,
    pub report_url: Option<String>,
    pub forms_url: Option<String>,
}

pub async fn complete(
    State(state): State<SharedState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let draft = state.session(session_id).await?;

    // Terminal state: re-entry just redisplays the summary.
    if draft.stage.is_terminal() {
        return Ok(Json(CompleteResponse {
            stage: draft.stage,
            student_id: draft.student_id,
            report_url: generated_url(&draft, "lln-assessment"),
            forms_url: generated_url(&draft, "enrollment-forms"),
        }));
    }
    wizard::ensure_reached(&draft, WizardStage::DocumentsCollected)?;

    let score = draft.score.clone().ok_or(EnrollmentError::StaleState {
        redirect_to: WizardStage::LlnInProgress,
    })?;
    let report = state
        .renderer
        .render_assessment_report(&draft.identity, &score)?;
    let forms = state.renderer.render_enrollment_forms(&draft)?;

    let folder_id = state
        .documents
        .ensure_folder(draft.student_id, &draft.identity.full_name())
        .await
        .map_err(EnrollmentError::collaborator)?;

    let (report_url, forms_url) = futures::future::try_join(
        state.documents.upload_file(
            &folder_id,
            &report.file_name,
            report.bytes,
            &report.mime_type,
            Some("generated"),
        ),
        state.documents.upload_file(
            &folder_id,
            &forms.file_name,
            forms.bytes,
            &forms.mime_type,
            Some("generated"),
        ),
    )
    .await
    .map_err(EnrollmentError::collaborator)?;

    // Persist the enrollment row before marking the draft terminal: if the
    // append fails the step must not advance.
    let mut candidate = draft.clone();
    candidate.documents.push(UploadedDocument {
        name: report.file_name.clone(),
        mime_type: report.mime_type.clone(),
        url: report_url.clone(),
        category: Some("generated".into()),
        uploaded_at: Utc::now(),
    });
    candidate.documents.push(UploadedDocument {
        name: forms.file_name.clone(),
        mime_type: forms.mime_type.clone(),
        url: forms_url.clone(),
        category: Some("generated".into()),
        uploaded_at: Utc::now(),
    });
    state
        .records
        .append_enrollment_row(&candidate)
        .await
        .map_err(EnrollmentError::collaborator)?;

    let stage = state
        .update_session(session_id, move |d| {
            d.documents = candidate.documents.clone();
            wizard::complete(d)?;
            Ok(d.stage)
        })
        .await?;

    Ok(Json(CompleteResponse {
        stage,
        student_id: draft.student_id,
        report_url: Some(report_url),
        forms_url: Some(forms_url),
    }))
}

fn generated_url(draft: &EnrollmentDraft, prefix: &str) -> Option<String> {
    draft
        .documents
        .iter()
        .find(|d| d.category.as_deref() == Some("generated") && d.name.starts_with(prefix))
        .map(|d| d.url.clone())
}
