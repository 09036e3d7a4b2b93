//! Collaborator trait definitions.
//!
//! These async traits are implemented by the `intake-stores` crate (record
//! and document stores) and the `intake-report` crate (document renderer).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{EnrollmentDraft, ScoreResult, StudentIdentity, StudentRecord};

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// Fields for creating a new student record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudentRecord {
    pub identity: StudentIdentity,
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// One assessment outcome appended to the assessment log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentRow {
    pub student_id: Uuid,
    pub identity: StudentIdentity,
    pub attempt_number: u32,
    pub score: ScoreResult,
}

/// Trait for the spreadsheet-like external record store.
///
/// The attempt-count increment is a read-then-write against the store; the
/// store re-reads the current count at write time rather than accepting a
/// count carried across the request.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Human-readable backend name (e.g. "sheets").
    fn name(&self) -> &str;

    /// Look up a record by the `(email, date_of_birth)` natural key.
    async fn find_by_identity(
        &self,
        email: &str,
        date_of_birth: NaiveDate,
    ) -> anyhow::Result<Option<StudentRecord>>;

    /// Look up a record by its generated id.
    async fn get_record(&self, student_id: Uuid) -> anyhow::Result<Option<StudentRecord>>;

    /// Create a record with `attempt_count = 0`, returning it.
    async fn create_record(&self, record: &NewStudentRecord) -> anyhow::Result<StudentRecord>;

    /// Increment the attempt count by exactly one, returning the new count.
    async fn increment_attempt(&self, student_id: Uuid) -> anyhow::Result<u32>;

    /// Administrative reset: attempt count back to zero, unblocked.
    /// Leaves `registered_at` and `folder_id` untouched.
    async fn reset_attempts(&self, student_id: Uuid) -> anyhow::Result<()>;

    /// Remember the student's document-store folder once it exists.
    async fn set_folder(&self, student_id: Uuid, folder_id: &str) -> anyhow::Result<()>;

    /// Append an assessment outcome to the assessment log.
    async fn append_assessment_row(&self, row: &AssessmentRow) -> anyhow::Result<()>;

    /// Append the completed enrollment to the enrollment log.
    async fn append_enrollment_row(&self, draft: &EnrollmentDraft) -> anyhow::Result<()>;

    /// List all student records (admin surface).
    async fn list_records(&self) -> anyhow::Result<Vec<StudentRecord>>;
}

// ---------------------------------------------------------------------------
// Document store
// ---------------------------------------------------------------------------

/// Metadata for a stored file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Trait for the hierarchical external document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable backend name (e.g. "drive").
    fn name(&self) -> &str;

    /// Find or create the folder for a student, returning its id.
    async fn ensure_folder(&self, student_id: Uuid, name: &str) -> anyhow::Result<String>;

    /// Upload a file into a folder (optionally a named subfolder),
    /// returning a viewing URL.
    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        subfolder: Option<&str>,
    ) -> anyhow::Result<String>;

    /// List the files in a folder.
    async fn list_folder(&self, folder_id: &str) -> anyhow::Result<Vec<FileMetadata>>;

    /// A link to the folder that can be shared with staff.
    async fn shareable_link(&self, folder_id: &str) -> anyhow::Result<String>;
}

// ---------------------------------------------------------------------------
// Document renderer
// ---------------------------------------------------------------------------

/// A rendered document ready for upload.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Trait for generating the college's documents from enrollment data.
pub trait DocumentRenderer: Send + Sync {
    /// The LLN assessment report for one scored attempt.
    fn render_assessment_report(
        &self,
        identity: &StudentIdentity,
        score: &ScoreResult,
    ) -> anyhow::Result<RenderedDocument>;

    /// The enrollment form pack for a completed draft.
    fn render_enrollment_forms(&self, draft: &EnrollmentDraft)
        -> anyhow::Result<RenderedDocument>;
}
