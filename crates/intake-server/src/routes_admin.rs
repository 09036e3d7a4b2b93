//! Admin endpoints, gated by the signed-token check.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use intake_core::error::EnrollmentError;
use intake_core::gate::MAX_ATTEMPTS;
use intake_core::model::{RecordStatus, StudentRecord};
use intake_core::traits::FileMetadata;

use crate::auth::{AdminClaims, PERM_MANAGE_STUDENTS};
use crate::error::ApiError;
use crate::state::SharedState;

/// Extract and verify the bearer token on an admin request.
fn require_admin(state: &SharedState, headers: &HeaderMap) -> Result<AdminClaims, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;
    state.verifier.verify(token).ok_or(ApiError::Unauthorized)
}

#[derive(Serialize)]
pub struct StudentSummary {
    pub student_id: Uuid,
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub attempt_count: u32,
    pub attempts_remaining: u32,
    pub is_blocked: bool,
    pub status: RecordStatus,
    pub registered_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl From<StudentRecord> for StudentSummary {
    fn from(record: StudentRecord) -> Self {
        Self {
            student_id: record.student_id,
            name: record.identity.full_name(),
            email: record.identity.email,
            date_of_birth: record.identity.date_of_birth,
            attempt_count: record.attempt_count,
            attempts_remaining: MAX_ATTEMPTS.saturating_sub(record.attempt_count),
            is_blocked: record.is_blocked,
            status: record.status,
            registered_at: record.registered_at,
            last_attempt_at: record.last_attempt_at,
        }
    }
}

pub async fn list_students(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<StudentSummary>>, ApiError> {
    require_admin(&state, &headers)?;
    let records = state
        .records
        .list_records()
        .await
        .map_err(EnrollmentError::collaborator)?;
    Ok(Json(records.into_iter().map(StudentSummary::from).collect()))
}

pub async fn get_student(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(student_id): Path<Uuid>,
) -> Result<Json<StudentSummary>, ApiError> {
    require_admin(&state, &headers)?;
    let record = state
        .records
        .get_record(student_id)
        .await
        .map_err(EnrollmentError::collaborator)?
        .ok_or(ApiError::NotFound("student"))?;
    Ok(Json(record.into()))
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub student_id: Uuid,
    pub attempt_count: u32,
    pub is_blocked: bool,
}

/// Explicit, permission-gated reset of the attempt count.
pub async fn reset_attempts(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(student_id): Path<Uuid>,
) -> Result<Json<ResetResponse>, ApiError> {
    let claims = require_admin(&state, &headers)?;
    if !claims.has_permission(PERM_MANAGE_STUDENTS) {
        return Err(ApiError::Forbidden);
    }

    // 404 before mutating anything.
    state
        .records
        .get_record(student_id)
        .await
        .map_err(EnrollmentError::collaborator)?
        .ok_or(ApiError::NotFound("student"))?;

    state.gate.reset(student_id).await?;
    tracing::info!(student_id = %student_id, role = %claims.role, "admin reset attempts");

    Ok(Json(ResetResponse {
        student_id,
        attempt_count: 0,
        is_blocked: false,
    }))
}

#[derive(Serialize)]
pub struct StudentDocumentsResponse {
    pub student_id: Uuid,
    pub folder_id: Option<String>,
    pub shareable_link: Option<String>,
    pub files: Vec<FileMetadata>,
}

pub async fn student_documents(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(student_id): Path<Uuid>,
) -> Result<Json<StudentDocumentsResponse>, ApiError> {
    require_admin(&state, &headers)?;
    let record = state
        .records
        .get_record(student_id)
        .await
        .map_err(EnrollmentError::collaborator)?
        .ok_or(ApiError::NotFound("student"))?;

    let Some(folder_id) = record.folder_id else {
        // Nothing uploaded yet; no folder is created just for browsing.
        return Ok(Json(StudentDocumentsResponse {
            student_id,
            folder_id: None,
            shareable_link: None,
            files: Vec::new(),
        }));
    };

    let files = state
        .documents
        .list_folder(&folder_id)
        .await
        .map_err(EnrollmentError::collaborator)?;
    let link = state
        .documents
        .shareable_link(&folder_id)
        .await
        .map_err(EnrollmentError::collaborator)?;

    Ok(Json(StudentDocumentsResponse {
        student_id,
        folder_id: Some(folder_id),
        shareable_link: Some(link),
        files,
    }))
}
