//! Enrollment form pack generator.

use intake_core::model::EnrollmentDraft;

use crate::{html_escape, CSS};

/// Generate the enrollment form pack as a self-contained HTML document.
pub fn generate_enrollment_forms(college_name: &str, draft: &EnrollmentDraft) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>Enrolment Forms — {}</title>\n",
        html_escape(&draft.identity.full_name())
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n</head>\n<body>\n");

    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(college_name)));
    html.push_str(&format!(
        "<p class=\"meta\">Enrolment Form Pack | {}</p>\n",
        draft.updated_at.format("%d %B %Y")
    ));
    html.push_str("</header>\n");

    // Student details
    html.push_str("<section>\n<h2>Student Details</h2>\n<table>\n");
    row(&mut html, "Name", &draft.identity.full_name());
    row(&mut html, "Email", &draft.identity.email);
    row(&mut html, "Date of birth", &draft.identity.date_of_birth.to_string());
    if let Some(details) = &draft.personal_details {
        row(
            &mut html,
            "Address",
            &format!(
                "{}, {} {} {}",
                details.street_address, details.suburb, details.state, details.postcode
            ),
        );
        row(&mut html, "Phone", &details.phone);
        row(
            &mut html,
            "Emergency contact",
            &format!(
                "{} ({})",
                details.emergency_contact_name, details.emergency_contact_phone
            ),
        );
        if let Some(usi) = &details.usi {
            row(&mut html, "USI", usi);
        }
    }
    html.push_str("</table>\n</section>\n");

    // Course
    if let Some(course) = &draft.course_details {
        html.push_str("<section>\n<h2>Course</h2>\n<table>\n");
        row(&mut html, "Code", &course.course_code);
        row(&mut html, "Course", &course.course_name);
        row(&mut html, "Delivery", &course.delivery_mode);
        if let Some(intake_date) = course.intake_date {
            row(&mut html, "Intake", &intake_date.to_string());
        }
        html.push_str("</table>\n</section>\n");
    }

    // Background
    if let Some(background) = &draft.background {
        html.push_str("<section>\n<h2>Background</h2>\n<table>\n");
        row(&mut html, "Highest schooling", &background.highest_schooling);
        row(
            &mut html,
            "Prior qualifications",
            &background.prior_qualifications.join(", "),
        );
        row(&mut html, "Employment", &background.employment_status);
        row(&mut html, "Country of birth", &background.country_of_birth);
        row(&mut html, "Main language", &background.main_language);
        if background.requires_support {
            row(
                &mut html,
                "Study support",
                background.support_details.as_deref().unwrap_or("Requested"),
            );
        }
        html.push_str("</table>\n</section>\n");
    }

    // Assessment summary
    if let Some(score) = &draft.score {
        html.push_str("<section>\n<h2>LLN Assessment</h2>\n");
        html.push_str(&format!(
            "<p>Overall {}% — {} ({})</p>\n",
            score.overall,
            html_escape(score.rating.label()),
            if score.eligible { "eligible" } else { "not eligible" }
        ));
        html.push_str("</section>\n");
    }

    // Declarations
    if let Some(declarations) = &draft.compliance {
        html.push_str("<section>\n<h2>Declarations</h2>\n<ul>\n");
        if declarations.privacy_consent {
            html.push_str("<li>Privacy collection notice accepted</li>\n");
        }
        if declarations.information_accurate {
            html.push_str("<li>Information declared true and accurate</li>\n");
        }
        if declarations.fees_acknowledged {
            html.push_str("<li>Fee schedule acknowledged</li>\n");
        }
        html.push_str("</ul>\n");
        html.push_str(&format!(
            "<p class=\"signature-line\">Signed: {} on {}</p>\n",
            html_escape(&declarations.signature_name),
            declarations.declared_at.format("%d %B %Y")
        ));
        html.push_str("</section>\n");
    }

    // Supplied documents
    if !draft.documents.is_empty() {
        html.push_str("<section>\n<h2>Supplied Documents</h2>\n<table>\n");
        html.push_str("<thead><tr><th>Document</th><th>Type</th></tr></thead>\n<tbody>\n");
        for document in &draft.documents {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                html_escape(&document.name),
                html_escape(document.category.as_deref().unwrap_or("general"))
            ));
        }
        html.push_str("</tbody></table>\n</section>\n");
    }

    html.push_str(&format!(
        "<footer>Generated by {} enrolment services. Reference: {}</footer>\n",
        html_escape(college_name),
        draft.student_id
    ));
    html.push_str("</body>\n</html>\n");

    html
}

fn row(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!(
        "<tr><th>{}</th><td>{}</td></tr>\n",
        html_escape(label),
        html_escape(value)
    ));
}
