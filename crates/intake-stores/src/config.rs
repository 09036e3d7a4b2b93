//! Configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use intake_core::traits::{DocumentStore, RecordStore};

use crate::drive::DriveDocumentStore;
use crate::mock::{MemoryDocumentStore, MemoryRecordStore};
use crate::sheets::SheetsRecordStore;

/// Configuration for the store backend.
///
/// Note: Custom Debug impl masks the access token to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Google {
        access_token: String,
        spreadsheet_id: String,
        drive_root_folder_id: String,
        #[serde(default)]
        sheets_base_url: Option<String>,
        #[serde(default)]
        drive_base_url: Option<String>,
    },
    Mock,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Google {
                access_token: _,
                spreadsheet_id,
                drive_root_folder_id,
                sheets_base_url,
                drive_base_url,
            } => f
                .debug_struct("Google")
                .field("access_token", &"***")
                .field("spreadsheet_id", spreadsheet_id)
                .field("drive_root_folder_id", drive_root_folder_id)
                .field("sheets_base_url", sheets_base_url)
                .field("drive_base_url", drive_base_url)
                .finish(),
            StoreConfig::Mock => f.debug_struct("Mock").finish(),
        }
    }
}

/// Server settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Secret for signing and verifying admin tokens.
    #[serde(default)]
    pub admin_secret: String,
    /// Admin token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("admin_secret", &"***")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_token_ttl_hours() -> u64 {
    12
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            admin_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

/// Top-level intake configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Store backend.
    #[serde(default = "default_store")]
    pub store: StoreConfig,
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Optional question bank override (TOML file). The built-in bank is
    /// used when unset.
    #[serde(default)]
    pub bank_path: Option<PathBuf>,
    /// Display name of the college on generated documents.
    #[serde(default = "default_college_name")]
    pub college_name: String,
}

fn default_store() -> StoreConfig {
    StoreConfig::Mock
}

fn default_college_name() -> String {
    "Harbour Vocational College".to_string()
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            server: ServerConfig::default(),
            bank_path: None,
            college_name: default_college_name(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Google {
            access_token,
            spreadsheet_id,
            drive_root_folder_id,
            sheets_base_url,
            drive_base_url,
        } => StoreConfig::Google {
            access_token: resolve_env_vars(access_token),
            spreadsheet_id: resolve_env_vars(spreadsheet_id),
            drive_root_folder_id: resolve_env_vars(drive_root_folder_id),
            sheets_base_url: sheets_base_url.as_ref().map(|u| resolve_env_vars(u)),
            drive_base_url: drive_base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        StoreConfig::Mock => StoreConfig::Mock,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `intake.toml` in the current directory
/// 2. `~/.config/intake/config.toml`
///
/// Environment variable overrides: `INTAKE_GOOGLE_TOKEN`,
/// `INTAKE_ADMIN_SECRET`.
pub fn load_config() -> Result<IntakeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<IntakeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("intake.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<IntakeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => IntakeConfig::default(),
    };

    // Apply env var overrides
    if let Ok(token) = std::env::var("INTAKE_GOOGLE_TOKEN") {
        if let StoreConfig::Google { access_token, .. } = &mut config.store {
            *access_token = token;
        }
    }
    if let Ok(secret) = std::env::var("INTAKE_ADMIN_SECRET") {
        config.server.admin_secret = secret;
    }

    config.store = resolve_store_config(&config.store);
    config.server.admin_secret = resolve_env_vars(&config.server.admin_secret);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("intake"))
}

/// Create the record store for a configuration.
pub fn create_record_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config {
        StoreConfig::Google {
            access_token,
            spreadsheet_id,
            sheets_base_url,
            ..
        } => {
            anyhow::ensure!(!access_token.is_empty(), "google access token is not set");
            Ok(Arc::new(SheetsRecordStore::new(
                access_token,
                spreadsheet_id,
                sheets_base_url.clone(),
            )))
        }
        StoreConfig::Mock => Ok(Arc::new(MemoryRecordStore::new())),
    }
}

/// Create the document store for a configuration.
pub fn create_document_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    match config {
        StoreConfig::Google {
            access_token,
            drive_root_folder_id,
            drive_base_url,
            ..
        } => {
            anyhow::ensure!(!access_token.is_empty(), "google access token is not set");
            Ok(Arc::new(DriveDocumentStore::new(
                access_token,
                drive_root_folder_id,
                drive_base_url.clone(),
            )))
        }
        StoreConfig::Mock => Ok(Arc::new(MemoryDocumentStore::new())),
    }
}
