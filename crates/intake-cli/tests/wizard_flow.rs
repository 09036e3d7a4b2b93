//! End-to-end wizard flow tests over the in-memory stores.
//!
//! These drive the core gate, scoring engine, and wizard state machine
//! together the way the server does, without HTTP in the way.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use intake_core::bank::default_bank;
use intake_core::error::EnrollmentError;
use intake_core::gate::{AttemptGate, MAX_ATTEMPTS};
use intake_core::model::{
    Answer, CourseDetails, EnrollmentDraft, PersonalDetails, Rating, ResponseKind, ResponseSet,
    StudentIdentity, UploadedDocument,
};
use intake_core::scoring::score;
use intake_core::traits::RecordStore;
use intake_core::wizard::{
    self, DeclarationSubmission, PersonalDetailsSubmission, WizardStage,
};
use intake_stores::mock::MemoryRecordStore;

fn identity() -> StudentIdentity {
    StudentIdentity {
        first_name: "Avery".into(),
        last_name: "Lee".into(),
        email: "a@x.com".into(),
        date_of_birth: NaiveDate::from_ymd_opt(1995, 1, 1).unwrap(),
    }
}

/// Answers crediting roughly the requested fraction of the bank.
fn responses_scoring(correct: usize) -> ResponseSet {
    let bank = default_bank();
    let mut responses = ResponseSet::new();
    for (index, question) in bank.questions().iter().enumerate() {
        let answer = if index < correct {
            match &question.kind {
                ResponseKind::Text { expected } => Answer::Text(
                    expected.clone().unwrap_or_else(|| "A written answer.".into()),
                ),
                ResponseKind::Number { expected } => {
                    Answer::Text(expected.clone().unwrap_or_else(|| "1".into()))
                }
                ResponseKind::Email => Answer::Text("a@x.com".into()),
                ResponseKind::SingleChoice { options, expected } => {
                    Answer::Text(expected.clone().unwrap_or_else(|| options[0].clone()))
                }
                ResponseKind::MultiChoice { options } => {
                    Answer::Selection(vec![options[0].clone()])
                }
            }
        } else {
            // Wrong for expected-answer questions, blank-ish for the rest.
            match &question.kind {
                ResponseKind::MultiChoice { .. } => Answer::Selection(vec![]),
                _ if question.kind.expected().is_some() => Answer::Text("zzz".into()),
                _ => Answer::Text(String::new()),
            }
        };
        responses.insert(question.id.clone(), answer);
    }
    responses
}

fn personal_submission() -> PersonalDetailsSubmission {
    PersonalDetailsSubmission {
        personal_details: PersonalDetails {
            street_address: "1 Trade St".into(),
            suburb: "Geelong".into(),
            state: "VIC".into(),
            postcode: "3220".into(),
            phone: "0400 000 000".into(),
            emergency_contact_name: "Jordan Lee".into(),
            emergency_contact_phone: "0400 111 111".into(),
            usi: None,
        },
        course_details: CourseDetails {
            course_code: "CHC33021".into(),
            course_name: "Certificate III in Individual Support".into(),
            delivery_mode: "on-campus".into(),
            intake_date: None,
        },
        background: None,
    }
}

fn declaration_submission() -> DeclarationSubmission {
    DeclarationSubmission {
        privacy_consent: true,
        information_accurate: true,
        fees_acknowledged: true,
        signature_name: "Avery Lee".into(),
    }
}

fn document() -> UploadedDocument {
    UploadedDocument {
        name: "photo-id.jpg".into(),
        mime_type: "image/jpeg".into(),
        url: "memory://folder/file-0".into(),
        category: Some("identification".into()),
        uploaded_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn two_attempt_scenario_rescores_independently() {
    let store = Arc::new(MemoryRecordStore::new());
    let gate = AttemptGate::new(store.clone());
    let bank = default_bank();

    // First attempt: 19/22 = 86%. Excellent, eligible.
    let outcome = gate.validate_or_register(&identity()).await.unwrap();
    assert!(outcome.is_new_student);
    let mut draft = EnrollmentDraft::new(Uuid::new_v4(), outcome.student_id, identity());
    wizard::begin_assessment(&mut draft).unwrap();

    gate.ensure_can_attempt(outcome.student_id).await.unwrap();
    let first = score(&bank, &responses_scoring(19));
    assert_eq!(first.rating, Rating::Excellent);
    assert!(first.eligible);
    let attempt = gate
        .record_submission(outcome.student_id, &identity(), &first)
        .await
        .unwrap();
    assert_eq!(attempt, 1);
    let stage = wizard::attach_score(&mut draft, first).unwrap();
    assert_eq!(stage, WizardStage::LlnResults);

    // Second attempt: 7/22 = 32%. The rating is recomputed from the new score
    // alone, never blended with the earlier attempt.
    wizard::retake(&mut draft).unwrap();
    gate.ensure_can_attempt(outcome.student_id).await.unwrap();
    let second = score(&bank, &responses_scoring(7));
    assert_eq!(second.rating, Rating::NeedsSignificantSupport);
    assert!(!second.eligible);
    let attempt = gate
        .record_submission(outcome.student_id, &identity(), &second)
        .await
        .unwrap();
    assert_eq!(attempt, 2);
    let stage = wizard::attach_score(&mut draft, second).unwrap();
    assert_eq!(stage, WizardStage::NotEligible);

    // Both outcomes were logged, in order.
    let assessments = store.assessments();
    assert_eq!(assessments.len(), 2);
    assert!(assessments[0].score.eligible);
    assert!(!assessments[1].score.eligible);
    assert_eq!(assessments[1].attempt_number, 2);
}

#[tokio::test]
async fn full_enrollment_lands_in_the_record_store() {
    let store = Arc::new(MemoryRecordStore::new());
    let gate = AttemptGate::new(store.clone());
    let bank = default_bank();

    let outcome = gate.validate_or_register(&identity()).await.unwrap();
    let mut draft = EnrollmentDraft::new(Uuid::new_v4(), outcome.student_id, identity());
    wizard::begin_assessment(&mut draft).unwrap();

    let result = score(&bank, &responses_scoring(22));
    gate.record_submission(outcome.student_id, &identity(), &result)
        .await
        .unwrap();
    wizard::attach_score(&mut draft, result).unwrap();

    wizard::submit_personal_details(&mut draft, personal_submission()).unwrap();
    wizard::submit_declaration(&mut draft, declaration_submission()).unwrap();
    wizard::add_documents(&mut draft, vec![document()]).unwrap();
    store.append_enrollment_row(&draft).await.unwrap();
    wizard::complete(&mut draft).unwrap();

    assert_eq!(draft.stage, WizardStage::EnrollmentComplete);
    let enrollments = store.enrollments();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0].student_id, outcome.student_id);

    // The record was promoted to enrolled.
    let record = store
        .get_record(outcome.student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status.to_string(), "enrolled");
}

#[tokio::test]
async fn blocked_identity_survives_store_roundtrips() {
    let store = Arc::new(MemoryRecordStore::new());
    let gate = AttemptGate::new(store.clone());
    let bank = default_bank();

    let outcome = gate.validate_or_register(&identity()).await.unwrap();
    let failing = score(&bank, &responses_scoring(5));

    for _ in 0..MAX_ATTEMPTS {
        gate.ensure_can_attempt(outcome.student_id).await.unwrap();
        gate.record_submission(outcome.student_id, &identity(), &failing)
            .await
            .unwrap();
    }

    // Refused before scoring on the next attempt, and on re-registration.
    let err = gate.ensure_can_attempt(outcome.student_id).await.unwrap_err();
    assert!(matches!(err, EnrollmentError::AttemptLimitExceeded { .. }));
    let registration = gate.validate_or_register(&identity()).await.unwrap();
    assert!(registration.blocked);
    assert!(!registration.is_new_student);

    // Admin reset reopens the gate without touching registration data.
    let before = store
        .get_record(outcome.student_id)
        .await
        .unwrap()
        .unwrap();
    gate.reset(outcome.student_id).await.unwrap();
    let after = store
        .get_record(outcome.student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.attempt_count, 0);
    assert_eq!(after.registered_at, before.registered_at);
    gate.ensure_can_attempt(outcome.student_id).await.unwrap();
}
