use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use intake_core::bank::{default_bank, parse_bank_str, validate_bank};

const BANK_TOML: &str = r#"
[bank]
id = "bench-v1"
name = "Bench Bank"

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
id = "digital-browser"
section = "digital"
prompt = "Which of these is a web browser?"
kind = "single_choice"
options = ["Firefox", "Excel", "Photoshop"]
expected = "Firefox"

[[questions]]
id = "learning-goals"
section = "learning"
prompt = "What do you hope to achieve?"
kind = "text"
"#;

fn bench_parse_bank(c: &mut Criterion) {
    c.bench_function("parse_bank_toml", |b| {
        b.iter(|| parse_bank_str(black_box(BANK_TOML), Path::new("bench.toml")).unwrap())
    });
}

fn bench_validate_bank(c: &mut Criterion) {
    let bank = default_bank();
    c.bench_function("validate_default_bank", |b| {
        b.iter(|| validate_bank(black_box(&bank)))
    });
}

criterion_group!(benches, bench_parse_bank, bench_validate_bank);
criterion_main!(benches);
