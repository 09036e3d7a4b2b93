//! The `intake validate` command.

use std::path::PathBuf;

use anyhow::Result;

use intake_core::bank::{default_bank, load_bank, validate_bank};

pub fn execute(bank_path: Option<PathBuf>) -> Result<()> {
    let bank = match &bank_path {
        Some(path) => load_bank(path)?,
        None => default_bank(),
    };

    let findings = validate_bank(&bank);
    if findings.is_empty() {
        eprintln!(
            "OK: bank '{}' ({} questions) passed validation",
            bank.id,
            bank.len()
        );
        return Ok(());
    }

    for finding in &findings {
        match &finding.question_id {
            Some(id) => eprintln!("  [{id}] {}", finding.message),
            None => eprintln!("  {}", finding.message),
        }
    }
    anyhow::bail!("bank '{}' failed validation ({} findings)", bank.id, findings.len());
}
