use std::fmt::Write;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hyformula::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

const SIMPLE: &str = "obj1 + obj2 * obj3 + obj2 * obj3 - 2 * (obj1 + obj2 * (obj4 - (obj5))) + 1";

fn rules() -> Vec<Rule> {
    vec![
        Rule::new(1, r"\(([^\(\)]+)\)").unwrap(),
        Rule::new(2, r"([^\s]+) \* ([^\s]+)").unwrap(),
        Rule::new(2, r"([^\s]+) \+ ([^\s]+)").unwrap(),
        Rule::new(2, r"([^\s]+) \- ([^\s]+)").unwrap(),
    ]
}

fn handlers<'a>(rules: &[Rule]) -> Handlers<'a, f64, FormulaError> {
    Handlers::from_parallel(
        rules,
        [
            Action::Identity,
            Action::apply(|v: &[f64]| Ok(v[0] * v[1])),
            Action::apply(|v: &[f64]| Ok(v[0] + v[1])),
            Action::apply(|v: &[f64]| Ok(v[0] - v[1])),
        ],
    )
}

/// Unknown symbols evaluate to one.
fn convert(text: &str) -> Result<f64, FormulaError> {
    Ok(text.parse().unwrap_or(1.0))
}

fn build_complex_text() -> String {
    // Use randomness seeded for determinism.
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);

    fn next_create(budget: usize, rng: &mut impl Rng, out: &mut String) {
        if budget == 0 || rng.random_bool(0.2) {
            // Leaves are drawn from a small pool so that sub-expressions repeat.
            if rng.random_bool(0.5) {
                write!(out, "{}", rng.random_range(0..10)).unwrap();
            } else {
                write!(out, "obj{}", rng.random_range(0..4)).unwrap();
            }
            return;
        }

        match rng.random_range(0..=3) {
            0 => {
                out.push('(');
                next_create(budget - 1, rng, out);
                out.push(')');
            }
            op => {
                next_create(budget - 1, rng, out);
                out.push_str([" * ", " + ", " - "][op - 1]);
                next_create(budget - 1, rng, out);
            }
        }
    }

    let mut out = String::new();
    next_create(10, &mut rng, &mut out);
    out
}

fn bench_sequence(c: &mut Criterion) {
    let simple = Formula::new(SIMPLE, rules());
    c.bench_function("sequence_simple", |b| {
        b.iter(|| {
            black_box(simple.sequence().unwrap());
        })
    });

    let complex = Formula::new(build_complex_text(), rules());
    c.bench_function("sequence_complex", |b| {
        b.iter(|| {
            black_box(complex.sequence().ok());
        })
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let rules = rules();
    let handlers = handlers(&rules);

    let simple = Formula::new(SIMPLE, rules.clone()).sequence().unwrap();
    c.bench_function("evaluate_simple", |b| {
        b.iter(|| {
            black_box(evaluate(&simple, &handlers, convert).unwrap());
        })
    });

    let Ok(complex) = Formula::new(build_complex_text(), rules.clone()).sequence() else {
        return;
    };
    c.bench_function("evaluate_complex", |b| {
        b.iter(|| {
            black_box(evaluate(&complex, &handlers, convert).ok());
        })
    });
}

criterion_group!(benches, bench_sequence, bench_evaluate);
criterion_main!(benches);
