//! The `intake score` command — offline scoring of a response file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use intake_core::bank::{default_bank, load_bank};
use intake_core::model::ResponseSet;
use intake_core::scoring::score;

pub fn execute(responses_path: PathBuf, bank_path: Option<PathBuf>, format: String) -> Result<()> {
    let bank = match &bank_path {
        Some(path) => load_bank(path)?,
        None => default_bank(),
    };

    let content = std::fs::read_to_string(&responses_path)
        .with_context(|| format!("failed to read responses: {}", responses_path.display()))?;
    let responses: ResponseSet = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse responses: {}", responses_path.display()))?;

    let result = score(&bank, &responses);

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "text" => {
            let mut table = Table::new();
            table.set_header(vec!["Section", "Score"]);
            for (section, pct) in &result.per_section {
                table.add_row(vec![
                    Cell::new(section.title()),
                    Cell::new(format!("{pct}%")),
                ]);
            }
            table.add_row(vec![
                Cell::new("Overall"),
                Cell::new(format!("{}%", result.overall)),
            ]);
            println!("{table}");
            println!(
                "Rating: {} | {}",
                result.rating,
                if result.eligible {
                    "eligible to enrol"
                } else {
                    "not eligible (below 60%)"
                }
            );
        }
        other => anyhow::bail!("unknown format: {other} (expected text or json)"),
    }

    Ok(())
}
