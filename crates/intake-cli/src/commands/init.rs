//! The `intake init` command — starter config and example bank.

use std::path::Path;

use anyhow::Result;

const CONFIG_TEMPLATE: &str = r#"# intake configuration
college_name = "Harbour Vocational College"

# Question bank override; the built-in 22-question LLN bank is used when
# unset.
# bank_path = "banks/example-bank.toml"

[store]
# "mock" keeps everything in memory — useful for local development.
# Switch to "google" for production:
#
# type = "google"
# access_token = "${INTAKE_GOOGLE_TOKEN}"
# spreadsheet_id = "your-spreadsheet-id"
# drive_root_folder_id = "your-drive-folder-id"
type = "mock"

[server]
bind_addr = "127.0.0.1:8080"
# Required for the admin surface and `intake students token`.
admin_secret = "${INTAKE_ADMIN_SECRET}"
"#;

const BANK_TEMPLATE: &str = r#"# Example question bank.
# Sections: learning, reading, writing, numeracy, digital-oral
# Kinds: text, number, email, single_choice, multi_choice
# Kinds with an `expected` answer are scored for correctness; the rest are
# scored for presence.

[bank]
id = "example-v1"
name = "Example Assessment"

[[questions]]
id = "reading-sign"
section = "reading"
prompt = "Which word on the sign means you must not enter?"
kind = "text"
expected = "prohibited"

[[questions]]
id = "numeracy-sum"
section = "numeracy"
prompt = "What is 19 + 23?"
kind = "number"
expected = "42"

[[questions]]
id = "learning-goals"
section = "learning"
prompt = "What do you hope to achieve by completing this course?"
kind = "text"

[[questions]]
id = "digital-browser"
section = "digital-oral"
prompt = "Which of these is a web browser?"
kind = "single_choice"
options = ["Firefox", "Excel", "Photoshop"]
expected = "Firefox"
"#;

pub fn execute() -> Result<()> {
    write_if_absent(Path::new("intake.toml"), CONFIG_TEMPLATE)?;
    std::fs::create_dir_all("banks")?;
    write_if_absent(Path::new("banks/example-bank.toml"), BANK_TEMPLATE)?;

    eprintln!("Next steps:");
    eprintln!("  1. Edit intake.toml (store credentials, admin secret).");
    eprintln!("  2. Run `intake validate --bank banks/example-bank.toml`.");
    eprintln!("  3. Run `intake serve`.");
    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        eprintln!("Skipping {} (already exists)", path.display());
        return Ok(());
    }
    std::fs::write(path, content)?;
    eprintln!("Created {}", path.display());
    Ok(())
}
