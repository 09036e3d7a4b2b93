use criterion::{black_box, criterion_group, criterion_main, Criterion};

use intake_core::bank::default_bank;
use intake_core::model::{Answer, ResponseKind, ResponseSet};
use intake_core::scoring::{rating_for, score};

fn full_responses() -> ResponseSet {
    let bank = default_bank();
    let mut responses = ResponseSet::new();
    for question in bank.questions() {
        let answer = match &question.kind {
            ResponseKind::Text { expected } => Answer::Text(
                expected
                    .clone()
                    .unwrap_or_else(|| "A written answer about work experience.".to_string()),
            ),
            ResponseKind::Number { expected } => {
                Answer::Text(expected.clone().unwrap_or_else(|| "0".to_string()))
            }
            ResponseKind::Email => Answer::Text("student@example.com".to_string()),
            ResponseKind::SingleChoice { options, expected } => {
                Answer::Text(expected.clone().unwrap_or_else(|| options[0].clone()))
            }
            ResponseKind::MultiChoice { options } => Answer::Selection(options.clone()),
        };
        responses.insert(question.id.clone(), answer);
    }
    responses
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");
    let bank = default_bank();

    group.bench_function("full_responses", |b| {
        let responses = full_responses();
        b.iter(|| score(black_box(&bank), black_box(&responses)))
    });

    group.bench_function("empty_responses", |b| {
        let responses = ResponseSet::new();
        b.iter(|| score(black_box(&bank), black_box(&responses)))
    });

    group.finish();
}

fn bench_rating(c: &mut Criterion) {
    c.bench_function("rating_ladder", |b| {
        b.iter(|| {
            for overall in 0..=100u8 {
                black_box(rating_for(black_box(overall)));
            }
        })
    });
}

criterion_group!(benches, bench_score, bench_rating);
criterion_main!(benches);
