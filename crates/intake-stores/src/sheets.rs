//! Google Sheets record store implementation.
//!
//! Students, assessment outcomes, and completed enrollments live on three
//! tabs of one spreadsheet. Rows are plain cell strings; this module owns
//! the row <-> record mapping.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use intake_core::gate::MAX_ATTEMPTS;
use intake_core::model::{EnrollmentDraft, RecordStatus, StudentIdentity, StudentRecord};
use intake_core::traits::{AssessmentRow, NewStudentRecord, RecordStore};

use crate::error::StoreError;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const STUDENTS_RANGE: &str = "Students!A2:K";
const ASSESSMENTS_RANGE: &str = "Assessments!A2:J";
const ENROLLMENTS_RANGE: &str = "Enrollments!A2:L";

/// Record store backed by a Google spreadsheet.
pub struct SheetsRecordStore {
    access_token: String,
    spreadsheet_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl SheetsRecordStore {
    pub fn new(access_token: &str, spreadsheet_id: &str, base_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            access_token: access_token.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        }
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, range
        )
    }

    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let response = self
            .client
            .get(self.values_url(range))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body: ValueRange = check_status(response).await?.json().await.map_err(|e| {
            StoreError::ApiError {
                status: 0,
                message: format!("failed to parse response: {e}"),
            }
        })?;
        Ok(body.values)
    }

    async fn append_row(&self, range: &str, row: Vec<String>) -> Result<(), StoreError> {
        let url = format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_url(range)
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&ValueRangeBody { values: vec![row] })
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn write_student_row(
        &self,
        row_number: usize,
        record: &StudentRecord,
    ) -> Result<(), StoreError> {
        let range = format!("Students!A{row_number}:K{row_number}");
        let url = format!("{}?valueInputOption=USER_ENTERED", self.values_url(&range));
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&ValueRangeBody {
                values: vec![record_to_row(record)],
            })
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    /// Read the Students tab, pairing each parsed record with its sheet
    /// row number. Malformed rows are skipped with a warning rather than
    /// failing the whole read.
    async fn fetch_students(&self) -> Result<Vec<(usize, StudentRecord)>, StoreError> {
        let rows = self.read_range(STUDENTS_RANGE).await?;
        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            // Data starts on sheet row 2, below the header.
            let row_number = index + 2;
            match row_to_record(row) {
                Ok(record) => records.push((row_number, record)),
                Err(reason) => {
                    tracing::warn!("skipping malformed Students row {row_number}: {reason}");
                }
            }
        }
        Ok(records)
    }

    async fn find_row(
        &self,
        student_id: Uuid,
    ) -> Result<Option<(usize, StudentRecord)>, StoreError> {
        Ok(self
            .fetch_students()
            .await?
            .into_iter()
            .find(|(_, r)| r.student_id == student_id))
    }
}

#[async_trait]
impl RecordStore for SheetsRecordStore {
    fn name(&self) -> &str {
        "sheets"
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_by_identity(
        &self,
        email: &str,
        date_of_birth: NaiveDate,
    ) -> anyhow::Result<Option<StudentRecord>> {
        let key = (email.trim().to_lowercase(), date_of_birth);
        let found = self
            .fetch_students()
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .find(|record| record.identity.dedup_key() == key);
        Ok(found)
    }

    async fn get_record(&self, student_id: Uuid) -> anyhow::Result<Option<StudentRecord>> {
        Ok(self.find_row(student_id).await?.map(|(_, record)| record))
    }

    async fn create_record(&self, record: &NewStudentRecord) -> anyhow::Result<StudentRecord> {
        let created = StudentRecord {
            student_id: Uuid::new_v4(),
            identity: record.identity.clone(),
            folder_id: record.folder_id.clone(),
            attempt_count: 0,
            is_blocked: false,
            registered_at: Utc::now(),
            last_attempt_at: None,
            status: RecordStatus::Registered,
        };
        self.append_row(STUDENTS_RANGE, record_to_row(&created))
            .await?;
        Ok(created)
    }

    async fn increment_attempt(&self, student_id: Uuid) -> anyhow::Result<u32> {
        // Re-read the row at write time so the increment applies to the
        // store's current count, not one carried across the request.
        let (row_number, mut record) = self
            .find_row(student_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("student {student_id}")))?;

        record.attempt_count += 1;
        record.is_blocked = record.attempt_count >= MAX_ATTEMPTS;
        record.last_attempt_at = Some(Utc::now());
        record.status = RecordStatus::Assessed;
        self.write_student_row(row_number, &record).await?;
        Ok(record.attempt_count)
    }

    async fn reset_attempts(&self, student_id: Uuid) -> anyhow::Result<()> {
        let (row_number, mut record) = self
            .find_row(student_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("student {student_id}")))?;

        record.attempt_count = 0;
        record.is_blocked = false;
        self.write_student_row(row_number, &record).await?;
        Ok(())
    }

    async fn set_folder(&self, student_id: Uuid, folder_id: &str) -> anyhow::Result<()> {
        let (row_number, mut record) = self
            .find_row(student_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("student {student_id}")))?;

        record.folder_id = Some(folder_id.to_string());
        self.write_student_row(row_number, &record).await?;
        Ok(())
    }

    async fn append_assessment_row(&self, row: &AssessmentRow) -> anyhow::Result<()> {
        let per_section = serde_json::to_string(&row.score.per_section)?;
        let cells = vec![
            row.score.completed_at.to_rfc3339(),
            row.student_id.to_string(),
            row.identity.full_name(),
            row.identity.email.clone(),
            row.identity.date_of_birth.to_string(),
            row.attempt_number.to_string(),
            row.score.overall.to_string(),
            row.score.rating.label().to_string(),
            row.score.eligible.to_string(),
            per_section,
        ];
        self.append_row(ASSESSMENTS_RANGE, cells).await?;
        Ok(())
    }

    async fn append_enrollment_row(&self, draft: &EnrollmentDraft) -> anyhow::Result<()> {
        let course = draft.course_details.as_ref();
        let details = draft.personal_details.as_ref();
        let cells = vec![
            draft.updated_at.to_rfc3339(),
            draft.student_id.to_string(),
            draft.identity.full_name(),
            draft.identity.email.clone(),
            draft.identity.date_of_birth.to_string(),
            course.map(|c| c.course_code.clone()).unwrap_or_default(),
            course.map(|c| c.course_name.clone()).unwrap_or_default(),
            details.map(|d| d.phone.clone()).unwrap_or_default(),
            details
                .map(|d| format!("{}, {} {} {}", d.street_address, d.suburb, d.state, d.postcode))
                .unwrap_or_default(),
            draft.score.as_ref().map(|s| s.overall.to_string()).unwrap_or_default(),
            draft.documents.len().to_string(),
            draft.stage.to_string(),
        ];
        self.append_row(ENROLLMENTS_RANGE, cells).await?;
        Ok(())
    }

    async fn list_records(&self) -> anyhow::Result<Vec<StudentRecord>> {
        Ok(self
            .fetch_students()
            .await?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Wire types and row mapping
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct ValueRangeBody {
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    message: String,
}

fn record_to_row(record: &StudentRecord) -> Vec<String> {
    vec![
        record.student_id.to_string(),
        record.identity.first_name.clone(),
        record.identity.last_name.clone(),
        record.identity.email.clone(),
        record.identity.date_of_birth.to_string(),
        record.folder_id.clone().unwrap_or_default(),
        record.attempt_count.to_string(),
        record.is_blocked.to_string(),
        record.registered_at.to_rfc3339(),
        record
            .last_attempt_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default(),
        record.status.to_string(),
    ]
}

fn row_to_record(row: &[String]) -> Result<StudentRecord, String> {
    let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");

    let student_id: Uuid = cell(0).parse().map_err(|_| "bad student id".to_string())?;
    let date_of_birth: NaiveDate = cell(4)
        .parse()
        .map_err(|_| "bad date of birth".to_string())?;
    let attempt_count: u32 = if cell(6).is_empty() {
        0
    } else {
        cell(6).parse().map_err(|_| "bad attempt count".to_string())?
    };
    let registered_at = DateTime::parse_from_rfc3339(cell(8))
        .map_err(|_| "bad registration timestamp".to_string())?
        .with_timezone(&Utc);
    let last_attempt_at = if cell(9).is_empty() {
        None
    } else {
        Some(
            DateTime::parse_from_rfc3339(cell(9))
                .map_err(|_| "bad last attempt timestamp".to_string())?
                .with_timezone(&Utc),
        )
    };
    let status: RecordStatus = if cell(10).is_empty() {
        RecordStatus::Registered
    } else {
        cell(10).parse()?
    };

    Ok(StudentRecord {
        student_id,
        identity: StudentIdentity {
            first_name: cell(1).to_string(),
            last_name: cell(2).to_string(),
            email: cell(3).to_string(),
            date_of_birth,
        },
        folder_id: match cell(5) {
            "" => None,
            folder => Some(folder.to_string()),
        },
        attempt_count,
        is_blocked: cell(7) == "true" || attempt_count >= MAX_ATTEMPTS,
        registered_at,
        last_attempt_at,
        status,
    })
}

fn map_transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else {
        StoreError::NetworkError(e.to_string())
    }
}

/// Map non-success statuses to typed errors; pass successes through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status().as_u16();
    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5)
            * 1000;
        return Err(StoreError::RateLimited {
            retry_after_ms: retry_after,
        });
    }
    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::AuthenticationFailed(body));
    }
    if status == 404 {
        return Err(StoreError::NotFound("spreadsheet or range".into()));
    }
    if status >= 400 {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GoogleError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(StoreError::ApiError { status, message });
    }
    Ok(response)
}
