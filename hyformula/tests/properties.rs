//! Behavioral guarantees of sequence building and evaluation.
use std::thread;

use hyformula::prelude::*;

fn brackets() -> Rule {
    Rule::new(1, r"\(([^\(\)]+)\)").unwrap()
}

fn times() -> Rule {
    Rule::new(2, r"([^\s]+) \* ([^\s]+)").unwrap()
}

fn plus() -> Rule {
    Rule::new(2, r"([^\s]+) \+ ([^\s]+)").unwrap()
}

fn minus() -> Rule {
    Rule::new(2, r"([^\s]+) \- ([^\s]+)").unwrap()
}

fn number(text: &str) -> Result<i64, FormulaError> {
    text.parse().map_err(|_| FormulaError::MalformedInput {
        text: text.to_string(),
    })
}

fn arithmetic<'a>() -> Handlers<'a, i64, FormulaError> {
    Handlers::new()
        .identity(&brackets())
        .with_fn(&times(), |v: &[i64]| Ok(v[0] * v[1]))
        .with_fn(&plus(), |v: &[i64]| Ok(v[0] + v[1]))
        .with_fn(&minus(), |v: &[i64]| Ok(v[0] - v[1]))
}

#[test]
fn building_is_deterministic() {
    let formula = Formula::new(
        "obj1 + obj2 * obj3 + obj2 * obj3 - 2 * (obj1 + obj2 * (obj4 - (obj5))) + 1",
        vec![brackets(), times(), plus(), minus()],
    );
    let first = formula.sequence().unwrap();
    for _ in 0..8 {
        assert_eq!(formula.sequence().unwrap(), first);
    }
}

#[test]
fn repeated_sub_expressions_share_a_step() {
    let formula = Formula::new("obj2 * obj3 + obj2 * obj3", vec![times(), plus()]);
    let sequence = formula.sequence().unwrap();

    // Without sharing there would be one step per product plus the sum.
    assert_eq!(sequence.len(), 2);
    assert_eq!(
        sequence[1].operands.as_slice(),
        &[Operand::Reference(0), Operand::Reference(0)]
    );
}

#[test]
fn references_only_point_backwards() {
    let rules = vec![brackets(), times(), plus(), minus()];
    for text in [
        "1 + 2",
        "(a)",
        "((a + b) * (a + b)) - (c * (a + b))",
        "obj1 + obj2 * obj3 + obj2 * obj3 - 2 * (obj1 + obj2 * (obj4 - (obj5))) + 1",
    ] {
        let sequence = Formula::new(text, rules.clone()).sequence().unwrap();
        for step in &sequence {
            for k in step.references() {
                assert!(k < step.id, "`{text}`: step #{} references #{k}", step.id);
            }
        }
    }
}

#[test]
fn root_is_the_value_of_the_formula() {
    let formula = Formula::new("1 + 2", vec![brackets(), plus()]);
    assert_eq!(formula.calculate(number, &arithmetic()), Ok(3));
}

#[test]
fn nested_groups_are_evaluated_first() {
    let formula = Formula::new("2 * (3 + 4)", vec![brackets(), times(), plus()]);
    assert_eq!(formula.calculate(number, &arithmetic()), Ok(14));
}

#[test]
fn higher_priority_rules_are_exhausted_first() {
    let formula = Formula::new("2 + 3 * 4", vec![times(), plus()]);
    assert_eq!(formula.calculate(number, &arithmetic()), Ok(14));

    let formula = Formula::new("2 + 3 * 4", vec![plus(), times()]);
    assert_eq!(formula.calculate(number, &arithmetic()), Ok(20));
}

#[test]
fn evaluation_does_not_depend_on_handler_order() {
    let rules = vec![brackets(), times(), plus()];
    let forward = Handlers::from_parallel(
        &rules,
        [
            Action::Identity,
            Action::apply(|v: &[i64]| Ok(v[0] * v[1])),
            Action::apply(|v: &[i64]| Ok(v[0] + v[1])),
        ],
    );
    let reversed: Handlers<'_, i64, FormulaError> = Handlers::new()
        .with_fn(&plus(), |v: &[i64]| Ok(v[0] + v[1]))
        .with_fn(&times(), |v: &[i64]| Ok(v[0] * v[1]))
        .identity(&brackets());

    let sequence = Formula::new("(1 + 2) * (3 + 4)", rules).sequence().unwrap();
    assert_eq!(evaluate(&sequence, &forward, number), Ok(21));
    assert_eq!(evaluate(&sequence, &reversed, number), Ok(21));
}

#[test]
fn independent_formulas_can_be_built_concurrently() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Rule>();
    assert_send_sync::<Formula>();
    assert_send_sync::<Sequence>();

    let rules = vec![brackets(), times(), plus(), minus()];
    let expected = Formula::new("(1 + 2) * 3 - 4", rules.clone())
        .sequence()
        .unwrap();

    thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let formula = Formula::new("(1 + 2) * 3 - 4", rules.clone());
                scope.spawn(move || {
                    let handlers = arithmetic();
                    let value = formula.calculate(number, &handlers);
                    (formula.sequence(), value)
                })
            })
            .collect();

        for worker in workers {
            let (sequence, value) = worker.join().unwrap();
            assert_eq!(sequence.as_ref(), Ok(&expected));
            assert_eq!(value, Ok(5));
        }
    });
}
