//! Shared application state.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use uuid::Uuid;

use intake_core::bank::{self, QuestionBank};
use intake_core::error::EnrollmentError;
use intake_core::gate::AttemptGate;
use intake_core::model::EnrollmentDraft;
use intake_core::traits::{DocumentRenderer, DocumentStore, RecordStore};
use intake_report::HtmlRenderer;
use intake_stores::{create_document_store, create_record_store, IntakeConfig};

use crate::auth::TokenVerifier;

pub type SharedState = Arc<AppState>;

/// Everything the handlers need, shared across requests.
///
/// Draft sessions are the only in-process mutable state: one browser
/// session drives one draft, created at wizard entry and terminal at
/// completion. The record store stays authoritative for submitted steps.
pub struct AppState {
    pub records: Arc<dyn RecordStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub gate: AttemptGate,
    pub bank: Arc<QuestionBank>,
    pub verifier: TokenVerifier,
    pub college_name: String,
    sessions: RwLock<HashMap<Uuid, EnrollmentDraft>>,
}

impl AppState {
    pub fn new(
        records: Arc<dyn RecordStore>,
        documents: Arc<dyn DocumentStore>,
        renderer: Arc<dyn DocumentRenderer>,
        bank: QuestionBank,
        verifier: TokenVerifier,
        college_name: impl Into<String>,
    ) -> SharedState {
        let gate = AttemptGate::new(Arc::clone(&records));
        Arc::new(Self {
            records,
            documents,
            renderer,
            gate,
            bank: Arc::new(bank),
            verifier,
            college_name: college_name.into(),
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Build state from configuration, refusing to boot on an invalid
    /// question bank.
    pub fn from_config(config: &IntakeConfig) -> Result<SharedState> {
        let bank = match &config.bank_path {
            Some(path) => bank::load_bank(path)
                .with_context(|| format!("failed to load question bank: {}", path.display()))?,
            None => bank::default_bank(),
        };
        let findings = bank::validate_bank(&bank);
        if !findings.is_empty() {
            for finding in &findings {
                tracing::error!(
                    "bank validation: {}{}",
                    finding
                        .question_id
                        .as_deref()
                        .map(|id| format!("[{id}] "))
                        .unwrap_or_default(),
                    finding.message
                );
            }
            anyhow::bail!("question bank failed validation ({} findings)", findings.len());
        }

        let records = create_record_store(&config.store)?;
        let documents = create_document_store(&config.store)?;
        let renderer = Arc::new(HtmlRenderer::new(config.college_name.clone()));

        Ok(Self::new(
            records,
            documents,
            renderer,
            bank,
            TokenVerifier::new(config.server.admin_secret.clone()),
            config.college_name.clone(),
        ))
    }

    /// Create a session for a fresh draft.
    pub async fn insert_session(&self, draft: EnrollmentDraft) {
        self.sessions.write().await.insert(draft.session_id, draft);
    }

    /// Snapshot of a session's draft.
    pub async fn session(&self, session_id: Uuid) -> Result<EnrollmentDraft, EnrollmentError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(EnrollmentError::UnknownSession)
    }

    /// Apply a closure to a session's draft, persisting the result only
    /// when the closure succeeds.
    pub async fn update_session<T>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&mut EnrollmentDraft) -> Result<T, EnrollmentError>,
    ) -> Result<T, EnrollmentError> {
        let mut sessions = self.sessions.write().await;
        let draft = sessions
            .get_mut(&session_id)
            .ok_or(EnrollmentError::UnknownSession)?;
        let mut working = draft.clone();
        let value = f(&mut working)?;
        *draft = working;
        Ok(value)
    }
}
