use hyformula::prelude::*;

fn main() -> Result<(), FormulaError> {
    let text = "group1:subscribers & !(user1:friends | user1:subscribers) & !user1:friends";
    println!("Formula: {text}");

    let rules = vec![
        Rule::new(1, r"\(([^\(\)]+)\)")?,
        Rule::new(1, r"\!([^\s]+)")?,
        Rule::new(2, r"([^\s]+) \& ([^\s]+)")?,
        Rule::new(2, r"([^\s]+) \| ([^\s]+)")?,
    ];
    let formula = Formula::new(text, rules);
    let sequence = formula.sequence()?;

    println!();
    println!("Steps:");
    for step in &sequence {
        println!("{step}");
        println!("    Action id: {}", formula.action_index(&step.rule)?);
    }

    println!();
    println!("Dependencies:");
    for operand in sequence.external_dependencies() {
        if let Some(text) = operand.try_as_literal_ref() {
            println!("{text}");
        }
    }
    Ok(())
}
