//! Core data model types for intake.
//!
//! These are the fundamental types the entire intake system uses to
//! represent assessment questions, student responses, scores, and the
//! enrollment draft accumulated across wizard steps.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::wizard::WizardStage;

/// The five sections of the LLN assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Learning,
    Reading,
    Writing,
    Numeracy,
    /// Digital literacy and oral communication.
    DigitalOral,
}

impl Section {
    /// All sections in presentation order.
    pub const ALL: [Section; 5] = [
        Section::Learning,
        Section::Reading,
        Section::Writing,
        Section::Numeracy,
        Section::DigitalOral,
    ];

    /// Human-readable section title for reports.
    pub fn title(&self) -> &'static str {
        match self {
            Section::Learning => "Learning",
            Section::Reading => "Reading",
            Section::Writing => "Writing",
            Section::Numeracy => "Numeracy",
            Section::DigitalOral => "Digital Literacy & Oral Communication",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Learning => write!(f, "learning"),
            Section::Reading => write!(f, "reading"),
            Section::Writing => write!(f, "writing"),
            Section::Numeracy => write!(f, "numeracy"),
            Section::DigitalOral => write!(f, "digital-oral"),
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "learning" => Ok(Section::Learning),
            "reading" => Ok(Section::Reading),
            "writing" => Ok(Section::Writing),
            "numeracy" | "maths" => Ok(Section::Numeracy),
            "digital-oral" | "digital" | "oral" => Ok(Section::DigitalOral),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

/// How a question is answered, and what (if anything) counts as correct.
///
/// Kinds with an `expected` answer are scored for correctness; kinds
/// without one are scored for presence only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseKind {
    /// Free text. Expected answers are credited on case-insensitive
    /// substring containment.
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected: Option<String>,
    },
    /// Numeric entry, compared as an exact string against `expected`.
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected: Option<String>,
    },
    /// Email entry, scored for presence.
    Email,
    /// One option from a fixed list; exact equality against `expected`.
    SingleChoice {
        options: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected: Option<String>,
    },
    /// Any number of options from a fixed list; scored for presence.
    MultiChoice { options: Vec<String> },
}

impl ResponseKind {
    /// The expected answer, for kinds that declare one.
    pub fn expected(&self) -> Option<&str> {
        match self {
            ResponseKind::Text { expected }
            | ResponseKind::Number { expected }
            | ResponseKind::SingleChoice { expected, .. } => expected.as_deref(),
            ResponseKind::Email | ResponseKind::MultiChoice { .. } => None,
        }
    }

    /// The fixed option list, for choice kinds.
    pub fn options(&self) -> Option<&[String]> {
        match self {
            ResponseKind::SingleChoice { options, .. } | ResponseKind::MultiChoice { options } => {
                Some(options)
            }
            _ => None,
        }
    }
}

/// A single assessment question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the bank.
    pub id: String,
    /// Section the question belongs to (exactly one).
    pub section: Section,
    /// The prompt shown to the student.
    pub prompt: String,
    /// Whether the wizard requires an answer before submission.
    #[serde(default)]
    pub required: bool,
    /// Response kind and scoring data.
    #[serde(flatten)]
    pub kind: ResponseKind,
}

/// A student's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Free text, numeric, or email entry (also accepts a single choice).
    Text(String),
    /// One or more selected options.
    Selection(Vec<String>),
}

impl Answer {
    /// The answer as a single value, when it holds exactly one.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            Answer::Selection(v) if v.len() == 1 => Some(&v[0]),
            Answer::Selection(_) => None,
        }
    }

    /// True when the answer carries no content after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Answer::Text(s) => s.trim().is_empty(),
            Answer::Selection(v) => v.iter().all(|s| s.trim().is_empty()),
        }
    }
}

/// A mapping from question id to answer, built up as the student advances.
///
/// Keys not present are treated as "unanswered"; nothing here is validated
/// until submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseSet(pub HashMap<String, Answer>);

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.0.get(question_id)
    }

    pub fn insert(&mut self, question_id: impl Into<String>, answer: Answer) {
        self.0.insert(question_id.into(), answer);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Qualitative rating derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    NeedsSignificantSupport,
    NeedsSomeSupport,
    Good,
    Excellent,
}

impl Rating {
    /// Human-readable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Rating::NeedsSignificantSupport => "Needs Significant Support",
            Rating::NeedsSomeSupport => "Needs Some Support",
            Rating::Good => "Good",
            Rating::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The outcome of scoring one completed response set.
///
/// Immutable once computed; a retake produces a new `ScoreResult` rather
/// than mutating the previous one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Percentage score per section, each in `[0, 100]`.
    pub per_section: BTreeMap<Section, u8>,
    /// Overall percentage in `[0, 100]`.
    pub overall: u8,
    /// Qualitative rating bucket.
    pub rating: Rating,
    /// `overall >= 60`.
    pub eligible: bool,
    /// When the assessment was scored.
    pub completed_at: DateTime<Utc>,
}

/// The identity a student registers with.
///
/// The natural deduplication key is `(email, date_of_birth)`: a student
/// may attempt the assessment before any generated id exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
}

impl StudentIdentity {
    /// Normalized deduplication key.
    pub fn dedup_key(&self) -> (String, NaiveDate) {
        (self.email.trim().to_lowercase(), self.date_of_birth)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Coarse progress status stored on the student record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    Registered,
    Assessed,
    Enrolled,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Registered => write!(f, "registered"),
            RecordStatus::Assessed => write!(f, "assessed"),
            RecordStatus::Enrolled => write!(f, "enrolled"),
        }
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "registered" => Ok(RecordStatus::Registered),
            "assessed" => Ok(RecordStatus::Assessed),
            "enrolled" => Ok(RecordStatus::Enrolled),
            other => Err(format!("unknown record status: {other}")),
        }
    }
}

/// The student record persisted in the external record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: Uuid,
    pub identity: StudentIdentity,
    /// Document-store folder for this student, once one exists.
    #[serde(default)]
    pub folder_id: Option<String>,
    /// Monotonically non-decreasing except for an explicit admin reset.
    pub attempt_count: u32,
    /// Derived: `attempt_count >= MAX_ATTEMPTS`. Terminal until reset.
    pub is_blocked: bool,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub status: RecordStatus,
}

/// Personal details collected after a passing assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub street_address: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub phone: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    #[serde(default)]
    pub usi: Option<String>,
}

/// Course selection details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetails {
    pub course_code: String,
    pub course_name: String,
    pub delivery_mode: String,
    #[serde(default)]
    pub intake_date: Option<NaiveDate>,
}

/// Background and study-support information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Background {
    #[serde(default)]
    pub highest_schooling: String,
    #[serde(default)]
    pub prior_qualifications: Vec<String>,
    #[serde(default)]
    pub employment_status: String,
    #[serde(default)]
    pub country_of_birth: String,
    #[serde(default)]
    pub main_language: String,
    #[serde(default)]
    pub requires_support: bool,
    #[serde(default)]
    pub support_details: Option<String>,
}

/// Declarations the student must accept before uploading documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declarations {
    pub privacy_consent: bool,
    pub information_accurate: bool,
    pub fees_acknowledged: bool,
    pub signature_name: String,
    pub declared_at: DateTime<Utc>,
}

/// A document uploaded to the student's folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub name: String,
    pub mime_type: String,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// The enrollment draft accumulated across wizard steps.
///
/// Held server-side per session and exclusively owned by that session
/// until final submission; the record store becomes authoritative for each
/// step once it is submitted there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentDraft {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub identity: StudentIdentity,
    /// The furthest checkpoint reached.
    pub stage: WizardStage,
    /// The current assessment result; replaced (not blended) on retake.
    #[serde(default)]
    pub score: Option<ScoreResult>,
    #[serde(default)]
    pub personal_details: Option<PersonalDetails>,
    #[serde(default)]
    pub course_details: Option<CourseDetails>,
    #[serde(default)]
    pub background: Option<Background>,
    #[serde(default)]
    pub compliance: Option<Declarations>,
    #[serde(default)]
    pub documents: Vec<UploadedDocument>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnrollmentDraft {
    /// A fresh draft at the start of the wizard.
    pub fn new(session_id: Uuid, student_id: Uuid, identity: StudentIdentity) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            student_id,
            identity,
            stage: WizardStage::Start,
            score: None,
            personal_details: None,
            course_details: None,
            background: None,
            compliance: None,
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
