//! In-memory stores for testing and local development.
//!
//! Both stores keep the same observable semantics as the Google-backed
//! implementations, including the re-read-at-write attempt increment and
//! the blocked-at-three derivation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use intake_core::gate::MAX_ATTEMPTS;
use intake_core::model::{EnrollmentDraft, RecordStatus, StudentRecord};
use intake_core::traits::{
    AssessmentRow, DocumentStore, FileMetadata, NewStudentRecord, RecordStore,
};

/// An in-memory record store.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<Uuid, StudentRecord>>,
    assessments: Mutex<Vec<AssessmentRow>>,
    enrollments: Mutex<Vec<EnrollmentDraft>>,
    call_count: AtomicU32,
    /// When set, every call fails, for exercising fail-closed paths.
    offline: std::sync::atomic::AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Toggle simulated outage.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Appended assessment rows, oldest first.
    pub fn assessments(&self) -> Vec<AssessmentRow> {
        self.assessments.lock().unwrap().clone()
    }

    /// Appended enrollment rows, oldest first.
    pub fn enrollments(&self) -> Vec<EnrollmentDraft> {
        self.enrollments.lock().unwrap().clone()
    }

    fn checkpoint(&self) -> anyhow::Result<()> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.offline.load(Ordering::Relaxed) {
            anyhow::bail!("record store offline");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_by_identity(
        &self,
        email: &str,
        date_of_birth: NaiveDate,
    ) -> anyhow::Result<Option<StudentRecord>> {
        self.checkpoint()?;
        let key = (email.trim().to_lowercase(), date_of_birth);
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.identity.dedup_key() == key)
            .cloned())
    }

    async fn get_record(&self, student_id: Uuid) -> anyhow::Result<Option<StudentRecord>> {
        self.checkpoint()?;
        Ok(self.records.lock().unwrap().get(&student_id).cloned())
    }

    async fn create_record(&self, record: &NewStudentRecord) -> anyhow::Result<StudentRecord> {
        self.checkpoint()?;
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
        self.records
            .lock()
            .unwrap()
            .insert(created.student_id, created.clone());
        Ok(created)
    }

    async fn increment_attempt(&self, student_id: Uuid) -> anyhow::Result<u32> {
        self.checkpoint()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&student_id)
            .ok_or_else(|| anyhow::anyhow!("no record for student {student_id}"))?;
        record.attempt_count += 1;
        record.is_blocked = record.attempt_count >= MAX_ATTEMPTS;
        record.last_attempt_at = Some(Utc::now());
        record.status = RecordStatus::Assessed;
        Ok(record.attempt_count)
    }

    async fn reset_attempts(&self, student_id: Uuid) -> anyhow::Result<()> {
        self.checkpoint()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&student_id)
            .ok_or_else(|| anyhow::anyhow!("no record for student {student_id}"))?;
        record.attempt_count = 0;
        record.is_blocked = false;
        Ok(())
    }

    async fn set_folder(&self, student_id: Uuid, folder_id: &str) -> anyhow::Result<()> {
        self.checkpoint()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&student_id)
            .ok_or_else(|| anyhow::anyhow!("no record for student {student_id}"))?;
        record.folder_id = Some(folder_id.to_string());
        Ok(())
    }

    async fn append_assessment_row(&self, row: &AssessmentRow) -> anyhow::Result<()> {
        self.checkpoint()?;
        self.assessments.lock().unwrap().push(row.clone());
        Ok(())
    }

    async fn append_enrollment_row(&self, draft: &EnrollmentDraft) -> anyhow::Result<()> {
        self.checkpoint()?;
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(&draft.student_id) {
            record.status = RecordStatus::Enrolled;
        }
        self.enrollments.lock().unwrap().push(draft.clone());
        Ok(())
    }

    async fn list_records(&self) -> anyhow::Result<Vec<StudentRecord>> {
        self.checkpoint()?;
        let mut records: Vec<StudentRecord> =
            self.records.lock().unwrap().values().cloned().collect();
        records.sort_by_key(|r| r.registered_at);
        Ok(records)
    }
}

/// An in-memory document store.
#[derive(Default)]
pub struct MemoryDocumentStore {
    /// folder id -> (folder name, files)
    folders: Mutex<HashMap<String, (String, Vec<FileMetadata>)>>,
    next_id: AtomicU32,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ensure_folder(&self, student_id: Uuid, name: &str) -> anyhow::Result<String> {
        let folder_name = format!("{name} ({student_id})");
        let mut folders = self.folders.lock().unwrap();
        if let Some(id) = folders
            .iter()
            .find_map(|(id, (existing, _))| (*existing == folder_name).then(|| id.clone()))
        {
            return Ok(id);
        }
        let id = self.mint_id("folder");
        folders.insert(id.clone(), (folder_name, Vec::new()));
        Ok(id)
    }

    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
        subfolder: Option<&str>,
    ) -> anyhow::Result<String> {
        let mut folders = self.folders.lock().unwrap();
        let (_, files) = folders
            .get_mut(folder_id)
            .ok_or_else(|| anyhow::anyhow!("no folder {folder_id}"))?;
        let id = self.mint_id("file");
        let display_name = match subfolder {
            Some(sub) => format!("{sub}/{name}"),
            None => name.to_string(),
        };
        let url = format!("memory://{folder_id}/{id}");
        files.push(FileMetadata {
            id,
            name: display_name,
            mime_type: mime_type.to_string(),
            size_bytes: Some(bytes.len() as u64),
            url: Some(url.clone()),
            modified_at: Some(Utc::now()),
        });
        Ok(url)
    }

    async fn list_folder(&self, folder_id: &str) -> anyhow::Result<Vec<FileMetadata>> {
        let folders = self.folders.lock().unwrap();
        let (_, files) = folders
            .get(folder_id)
            .ok_or_else(|| anyhow::anyhow!("no folder {folder_id}"))?;
        Ok(files.clone())
    }

    async fn shareable_link(&self, folder_id: &str) -> anyhow::Result<String> {
        Ok(format!("memory://{folder_id}"))
    }
}
