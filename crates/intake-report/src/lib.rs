//! intake-report — document generation for intake.
//!
//! Produces self-contained, print-ready HTML files with all CSS inlined:
//! the LLN assessment report and the enrollment form pack.

pub mod assessment;
pub mod forms;

use intake_core::model::{EnrollmentDraft, ScoreResult, StudentIdentity};
use intake_core::traits::{DocumentRenderer, RenderedDocument};

/// Escape a string for safe HTML insertion.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Shared stylesheet for generated documents.
pub(crate) const CSS: &str = r#"
body { font-family: Georgia, 'Times New Roman', serif; color: #1a1a1a; margin: 2.5rem auto; max-width: 52rem; line-height: 1.5; }
header { border-bottom: 3px solid #14466b; padding-bottom: 0.75rem; margin-bottom: 1.5rem; }
h1 { margin: 0; font-size: 1.6rem; color: #14466b; }
h2 { font-size: 1.15rem; color: #14466b; border-bottom: 1px solid #d0d7de; padding-bottom: 0.25rem; margin-top: 1.75rem; }
p.meta { color: #555; margin: 0.4rem 0 0 0; }
table { border-collapse: collapse; width: 100%; margin: 0.75rem 0; }
th, td { border: 1px solid #d0d7de; padding: 0.4rem 0.6rem; text-align: left; }
th { background: #f0f4f8; }
.badge { display: inline-block; padding: 0.2rem 0.7rem; border-radius: 3px; font-weight: bold; }
.badge.pass { background: #dcf2e3; color: #1a6b3c; }
.badge.fail { background: #fbe3e4; color: #a8222c; }
.signature-line { margin-top: 2.5rem; border-top: 1px solid #1a1a1a; width: 18rem; padding-top: 0.25rem; color: #555; }
footer { margin-top: 2.5rem; color: #888; font-size: 0.85rem; border-top: 1px solid #d0d7de; padding-top: 0.5rem; }
@media print { body { margin: 0.5rem; } }
"#;

/// `DocumentRenderer` producing self-contained HTML documents.
pub struct HtmlRenderer {
    college_name: String,
}

impl HtmlRenderer {
    pub fn new(college_name: impl Into<String>) -> Self {
        Self {
            college_name: college_name.into(),
        }
    }
}

impl DocumentRenderer for HtmlRenderer {
    fn render_assessment_report(
        &self,
        identity: &StudentIdentity,
        score: &ScoreResult,
    ) -> anyhow::Result<RenderedDocument> {
        let html = assessment::generate_assessment_report(&self.college_name, identity, score);
        Ok(RenderedDocument {
            file_name: format!(
                "lln-assessment-{}.html",
                score.completed_at.format("%Y%m%dT%H%M%S")
            ),
            mime_type: "text/html".to_string(),
            bytes: html.into_bytes(),
        })
    }

    fn render_enrollment_forms(
        &self,
        draft: &EnrollmentDraft,
    ) -> anyhow::Result<RenderedDocument> {
        let html = forms::generate_enrollment_forms(&self.college_name, draft);
        Ok(RenderedDocument {
            file_name: format!("enrollment-forms-{}.html", draft.student_id),
            mime_type: "text/html".to_string(),
            bytes: html.into_bytes(),
        })
    }
}
