//! Question bank: the built-in LLN assessment plus TOML-loadable banks.
//!
//! The bank is an ordered list; order defines presentation sequence and
//! section grouping. The default bank ships in code and is the one the
//! college runs; alternative banks can be loaded from TOML and validated.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Question, ResponseKind, Section};

/// An ordered, immutable set of assessment questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(id: impl Into<String>, name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            questions,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

fn text(
    id: &str,
    section: Section,
    prompt: &str,
    expected: Option<&str>,
    required: bool,
) -> Question {
    Question {
        id: id.into(),
        section,
        prompt: prompt.into(),
        required,
        kind: ResponseKind::Text {
            expected: expected.map(Into::into),
        },
    }
}

fn number(id: &str, section: Section, prompt: &str, expected: &str) -> Question {
    Question {
        id: id.into(),
        section,
        prompt: prompt.into(),
        required: true,
        kind: ResponseKind::Number {
            expected: Some(expected.into()),
        },
    }
}

fn single(
    id: &str,
    section: Section,
    prompt: &str,
    options: &[&str],
    expected: Option<&str>,
) -> Question {
    Question {
        id: id.into(),
        section,
        prompt: prompt.into(),
        required: true,
        kind: ResponseKind::SingleChoice {
            options: options.iter().map(|o| o.to_string()).collect(),
            expected: expected.map(Into::into),
        },
    }
}

fn multi(id: &str, section: Section, prompt: &str, options: &[&str]) -> Question {
    Question {
        id: id.into(),
        section,
        prompt: prompt.into(),
        required: false,
        kind: ResponseKind::MultiChoice {
            options: options.iter().map(|o| o.to_string()).collect(),
        },
    }
}

/// The built-in 22-question LLN assessment across the five sections.
pub fn default_bank() -> QuestionBank {
    use Section::*;

    let questions = vec![
        // Learning
        text(
            "learning-goals",
            Learning,
            "What do you hope to achieve by completing this course?",
            None,
            true,
        ),
        single(
            "learning-style",
            Learning,
            "Which way do you learn best?",
            &[
                "Watching demonstrations",
                "Reading and taking notes",
                "Hands-on practice",
                "Group discussion",
            ],
            None,
        ),
        multi(
            "learning-prior",
            Learning,
            "Where have you studied or trained before? Select all that apply.",
            &[
                "School",
                "TAFE or college",
                "On the job",
                "Online courses",
                "None of these",
            ],
        ),
        text(
            "learning-support",
            Learning,
            "Describe any support you think you may need with your study.",
            None,
            false,
        ),
        // Reading
        text(
            "reading-notice",
            Reading,
            "Read the notice: \"All students must attend the induction session. \
             Attendance is mandatory and enrolment cannot be completed without it.\" \
             Which word in the notice tells you attendance is required?",
            Some("mandatory"),
            true,
        ),
        single(
            "reading-timetable",
            Reading,
            "Your timetable shows Workplace Safety at 9am on Tuesday. \
             On which day is the Workplace Safety class?",
            &["Monday", "Tuesday", "Wednesday", "Thursday"],
            Some("Tuesday"),
        ),
        single(
            "reading-comprehension",
            Reading,
            "What is the main purpose of a safety data sheet?",
            &[
                "To keep workers safe",
                "To advertise products",
                "To order supplies",
                "To record attendance",
            ],
            Some("To keep workers safe"),
        ),
        single(
            "reading-instructions",
            Reading,
            "A procedure lists: 1. Put on gloves. 2. Start the machine. \
             3. Feed the material. What is the first step?",
            &[
                "Put on gloves",
                "Start the machine",
                "Call a supervisor",
                "Feed the material",
            ],
            Some("Put on gloves"),
        ),
        text(
            "reading-form",
            Reading,
            "An application form is complete except for one thing at the bottom. \
             The office returned it marked \"missing signature\". \
             What does the form still need?",
            Some("signature"),
            true,
        ),
        // Writing
        text(
            "writing-about-you",
            Writing,
            "In two or three sentences, tell us about your work experience.",
            None,
            true,
        ),
        text(
            "writing-message",
            Writing,
            "Write a short message to your trainer explaining that you will be \
             15 minutes late to class.",
            None,
            true,
        ),
        Question {
            id: "writing-email".into(),
            section: Writing,
            prompt: "What email address should we use to contact you about your application?"
                .into(),
            required: true,
            kind: ResponseKind::Email,
        },
        text(
            "writing-list",
            Writing,
            "List three items of personal protective equipment used in your industry.",
            None,
            false,
        ),
        // Numeracy
        number(
            "numeracy-addition",
            Numeracy,
            "A job uses 12 screws in the morning and 15 in the afternoon. \
             How many screws were used in total?",
            "27",
        ),
        number(
            "numeracy-money",
            Numeracy,
            "You buy materials for $85 and pay with a $100 note. \
             How much change should you receive, in dollars?",
            "15",
        ),
        number(
            "numeracy-measure",
            Numeracy,
            "A shelf is 2.5 metres long. How many millimetres is that?",
            "2500",
        ),
        single(
            "numeracy-time",
            Numeracy,
            "A break starts at 10:15 and ends at 11:00. How long is the break?",
            &["30 minutes", "45 minutes", "60 minutes", "90 minutes"],
            Some("45 minutes"),
        ),
        single(
            "numeracy-fraction",
            Numeracy,
            "Half of the 16 students in your group are in the workshop. \
             How many students is that?",
            &["4", "6", "8", "12"],
            Some("8"),
        ),
        // Digital literacy / oral communication
        single(
            "digital-confidence",
            DigitalOral,
            "How confident are you using a computer or tablet?",
            &[
                "Very confident",
                "Confident",
                "Need some help",
                "Need a lot of help",
            ],
            None,
        ),
        multi(
            "digital-tools",
            DigitalOral,
            "Which of these have you used before? Select all that apply.",
            &[
                "Email",
                "Word processing",
                "Spreadsheets",
                "Video calls",
                "Online forms",
            ],
        ),
        single(
            "digital-attachment",
            DigitalOral,
            "Your trainer asks you to email your resume. \
             Which action adds the resume to your email?",
            &[
                "Attach a file",
                "Delete the email",
                "Print the page",
                "Change the password",
            ],
            Some("Attach a file"),
        ),
        text(
            "oral-intro",
            DigitalOral,
            "Write down how you would introduce yourself to a new work team.",
            None,
            true,
        ),
    ];

    QuestionBank::new("lln-default-v1", "LLN Assessment", questions)
}

// ---------------------------------------------------------------------------
// TOML bank loading
// ---------------------------------------------------------------------------

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    section: String,
    prompt: String,
    kind: String,
    #[serde(default)]
    required: Option<bool>,
    #[serde(default)]
    expected: Option<String>,
    #[serde(default)]
    options: Vec<String>,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;
    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let section: Section = q
                .section
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;
            let kind = match q.kind.as_str() {
                "text" => ResponseKind::Text {
                    expected: q.expected,
                },
                "number" => ResponseKind::Number {
                    expected: q.expected,
                },
                "email" => ResponseKind::Email,
                "single_choice" => ResponseKind::SingleChoice {
                    options: q.options,
                    expected: q.expected,
                },
                "multi_choice" => ResponseKind::MultiChoice { options: q.options },
                other => anyhow::bail!("question '{}': unknown kind: {}", q.id, other),
            };
            Ok(Question {
                id: q.id,
                section,
                prompt: q.prompt,
                required: q.required.unwrap_or(true),
                kind,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank::new(parsed.bank.id, parsed.bank.name, questions))
}

/// A finding from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationFinding {
    /// The question id (if applicable).
    pub question_id: Option<String>,
    /// Finding message.
    pub message: String,
}

/// Validate a bank for common authoring mistakes.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationFinding> {
    let mut findings = Vec::new();

    if bank.is_empty() {
        findings.push(ValidationFinding {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    for question in bank.questions() {
        if !seen_ids.insert(&question.id) {
            findings.push(ValidationFinding {
                question_id: Some(question.id.clone()),
                message: format!("duplicate question id: {}", question.id),
            });
        }

        if question.prompt.trim().is_empty() {
            findings.push(ValidationFinding {
                question_id: Some(question.id.clone()),
                message: "prompt is empty".into(),
            });
        }

        if let Some(options) = question.kind.options() {
            if options.is_empty() {
                findings.push(ValidationFinding {
                    question_id: Some(question.id.clone()),
                    message: "choice question has no options".into(),
                });
            }
            if let Some(expected) = question.kind.expected() {
                if !options.iter().any(|o| o == expected) {
                    findings.push(ValidationFinding {
                        question_id: Some(question.id.clone()),
                        message: format!("expected answer '{expected}' is not one of the options"),
                    });
                }
            }
        }

        if let ResponseKind::Text {
            expected: Some(expected),
        } = &question.kind
        {
            if expected.trim().is_empty() {
                findings.push(ValidationFinding {
                    question_id: Some(question.id.clone()),
                    message: "expected answer is blank".into(),
                });
            }
        }
    }

    findings
}
