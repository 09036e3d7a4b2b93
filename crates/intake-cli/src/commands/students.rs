//! The `intake students` commands — admin actions against the record store.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use uuid::Uuid;

use intake_core::gate::MAX_ATTEMPTS;
use intake_server::auth::TokenVerifier;
use intake_stores::config::load_config_from;
use intake_stores::create_record_store;

pub async fn list(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = create_record_store(&config.store)?;
    let records = store.list_records().await.context("failed to list students")?;

    if records.is_empty() {
        eprintln!("No registered students.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Student ID",
        "Name",
        "Email",
        "Attempts",
        "Blocked",
        "Status",
        "Registered",
    ]);
    for record in &records {
        table.add_row(vec![
            Cell::new(record.student_id),
            Cell::new(record.identity.full_name()),
            Cell::new(&record.identity.email),
            Cell::new(format!("{}/{}", record.attempt_count, MAX_ATTEMPTS)),
            Cell::new(if record.is_blocked { "yes" } else { "no" }),
            Cell::new(record.status),
            Cell::new(record.registered_at.format("%Y-%m-%d")),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn reset(config_path: Option<PathBuf>, student_id: Uuid) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = create_record_store(&config.store)?;

    let record = store
        .get_record(student_id)
        .await
        .context("failed to look up student")?
        .with_context(|| format!("no student with id {student_id}"))?;

    store
        .reset_attempts(student_id)
        .await
        .context("failed to reset attempts")?;

    eprintln!(
        "Reset attempts for {} <{}> (was {}/{MAX_ATTEMPTS}).",
        record.identity.full_name(),
        record.identity.email,
        record.attempt_count
    );
    Ok(())
}

pub fn token(
    config_path: Option<PathBuf>,
    role: String,
    permissions: String,
    ttl_hours: i64,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    anyhow::ensure!(
        !config.server.admin_secret.is_empty(),
        "no admin secret configured; set server.admin_secret or INTAKE_ADMIN_SECRET"
    );

    let permissions: Vec<String> = permissions
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    let verifier = TokenVerifier::new(config.server.admin_secret);
    let token = verifier.issue(&role, &permissions, chrono::Duration::hours(ttl_hours))?;
    println!("{token}");
    Ok(())
}
