//! LLN assessment report generator.

use intake_core::model::{ScoreResult, StudentIdentity};

use crate::{html_escape, CSS};

/// Generate the assessment report as a self-contained HTML document.
pub fn generate_assessment_report(
    college_name: &str,
    identity: &StudentIdentity,
    score: &ScoreResult,
) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>LLN Assessment Report — {}</title>\n",
        html_escape(&identity.full_name())
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(college_name)));
    html.push_str(&format!(
        "<p class=\"meta\">Language, Literacy and Numeracy Assessment Report | {}</p>\n",
        score.completed_at.format("%d %B %Y, %H:%M UTC")
    ));
    html.push_str("</header>\n");

    html.push_str("<section>\n<h2>Student</h2>\n<table>\n");
    html.push_str(&format!(
        "<tr><th>Name</th><td>{}</td></tr>\n",
        html_escape(&identity.full_name())
    ));
    html.push_str(&format!(
        "<tr><th>Email</th><td>{}</td></tr>\n",
        html_escape(&identity.email)
    ));
    html.push_str(&format!(
        "<tr><th>Date of birth</th><td>{}</td></tr>\n",
        identity.date_of_birth
    ));
    html.push_str("</table>\n</section>\n");

    html.push_str("<section>\n<h2>Result</h2>\n");
    let badge_class = if score.eligible { "pass" } else { "fail" };
    let verdict = if score.eligible {
        "Eligible to enrol"
    } else {
        "Not yet eligible to enrol"
    };
    html.push_str(&format!(
        "<p>Overall score: <strong>{}%</strong> — rating <strong>{}</strong></p>\n",
        score.overall,
        html_escape(score.rating.label())
    ));
    html.push_str(&format!(
        "<p><span class=\"badge {badge_class}\">{verdict}</span></p>\n"
    ));

    html.push_str("<table>\n<thead><tr><th>Section</th><th>Score</th></tr></thead>\n<tbody>\n");
    for (section, pct) in &score.per_section {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}%</td></tr>\n",
            html_escape(section.title()),
            pct
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");

    if !score.eligible {
        html.push_str(
            "<section>\n<h2>Next steps</h2>\n\
             <p>This result does not meet the 60% threshold required for \
             enrolment. Please contact student support to discuss study \
             options and further attempts.</p>\n</section>\n",
        );
    }

    html.push_str(&format!(
        "<footer>Generated by {} enrolment services.</footer>\n",
        html_escape(college_name)
    ));
    html.push_str("</body>\n</html>\n");

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use intake_core::model::{Rating, Section};
    use std::collections::BTreeMap;

    fn identity() -> StudentIdentity {
        StudentIdentity {
            first_name: "Avery".into(),
            last_name: "O'Neil".into(),
            email: "a@x.com".into(),
            date_of_birth: chrono::NaiveDate::from_ymd_opt(1995, 1, 1).unwrap(),
        }
    }

    fn score(overall: u8, eligible: bool) -> ScoreResult {
        let mut per_section = BTreeMap::new();
        per_section.insert(Section::Reading, 80u8);
        per_section.insert(Section::Numeracy, 60u8);
        ScoreResult {
            per_section,
            overall,
            rating: Rating::Good,
            eligible,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn report_contains_scores_and_verdict() {
        let html = generate_assessment_report("Harbour Vocational College", &identity(), &score(72, true));
        assert!(html.contains("72%"));
        assert!(html.contains("Reading"));
        assert!(html.contains("Eligible to enrol"));
        assert!(!html.contains("Next steps"));
    }

    #[test]
    fn ineligible_report_points_to_support() {
        let html = generate_assessment_report("Harbour Vocational College", &identity(), &score(45, false));
        assert!(html.contains("Not yet eligible"));
        assert!(html.contains("contact student support"));
    }

    #[test]
    fn student_names_are_escaped() {
        let html = generate_assessment_report("Harbour Vocational College", &identity(), &score(72, true));
        assert!(html.contains("O&#x27;Neil"));
        assert!(!html.contains("O'Neil"));
    }
}
