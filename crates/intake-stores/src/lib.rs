//! intake-stores — record and document store integrations.
//!
//! Implements the `RecordStore` and `DocumentStore` traits for Google
//! Sheets and Google Drive, plus in-memory stores for tests and local
//! development.

pub mod config;
pub mod drive;
pub mod error;
pub mod mock;
pub mod sheets;

pub use config::{
    create_document_store, create_record_store, load_config, IntakeConfig, StoreConfig,
};
pub use error::StoreError;
