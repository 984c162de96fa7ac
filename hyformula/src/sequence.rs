//! Steps, operands and the dependency-ordered sequence built from an expression.
//!
//! A [`Sequence`] lists one [`Step`] per distinct sub-expression, in discovery order. Every
//! [`Operand::Reference`] points to a strictly earlier step, so evaluating the steps front to
//! back never needs a value that is not computed yet. The last step is the root of the formula.
use std::{collections::HashSet, fmt, ops::Index};

use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::{EnumIs, EnumTryAs};

use crate::{
    alias::{Alias, Reducer},
    config::FormulaConfig,
    error::{FormulaError, FormulaResult},
    rule::Rule,
};

/// Operand of a step: raw text for the caller to convert, or the result of an earlier step.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operand {
    /// Raw text, handed to the literal converter at evaluation time.
    Literal(String),
    /// Index of an earlier step whose result is used as this operand.
    Reference(usize),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(text) => write!(f, "{}(String)", text),
            Operand::Reference(id) => write!(f, "step #{}", id),
        }
    }
}

/// One computation of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Step {
    /// Position of the step inside its sequence (equal to its discovery order).
    pub id: usize,
    /// Rule that produced the step.
    pub rule: Rule,
    /// Index of [`Step::rule`] in the rule list the sequence was built with.
    pub action: usize,
    /// Operands, one per capture group of the rule.
    pub operands: SmallVec<[Operand; 4]>,
    /// Matched text with captures replaced by their reduced forms (alias tokens or literals).
    pub source: String,
}

impl Step {
    fn from_alias(id: usize, alias: Alias, rules: &[Rule]) -> FormulaResult<Self> {
        let rule = rules
            .get(alias.action)
            .ok_or_else(|| FormulaError::InternalInconsistency {
                reason: format!("alias #{} refers to unknown rule #{}", id, alias.action),
            })?;

        if alias.operands.len() != rule.operand_count() {
            return Err(FormulaError::InternalInconsistency {
                reason: format!(
                    "alias #{} has {} operand(s) but rule `{}` declares {}",
                    id,
                    alias.operands.len(),
                    rule.source(),
                    rule.operand_count()
                ),
            });
        }

        if let Some(forward) = alias
            .operands
            .iter()
            .filter_map(Operand::try_as_reference_ref)
            .find(|&&k| k >= id)
        {
            return Err(FormulaError::InternalInconsistency {
                reason: format!("step #{} references step #{}", id, forward),
            });
        }

        Ok(Self {
            id,
            rule: rule.clone(),
            action: alias.action,
            operands: alias.operands,
            source: alias.text,
        })
    }

    /// Iterate over the ids of the steps this step depends on.
    pub fn references(&self) -> impl Iterator<Item = usize> + '_ {
        self.operands
            .iter()
            .filter_map(Operand::try_as_reference_ref)
            .copied()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step #{}. Depends on: ", self.id)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", operand)?;
        }
        Ok(())
    }
}

/// Dependency-ordered list of steps. The last step is the root of the formula.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sequence {
    steps: Vec<Step>,
}

impl Sequence {
    /// Reduce `text` with `rules` (highest priority first) and build its step sequence.
    ///
    /// An input that no rule matches at all is a bare literal and yields an empty sequence.
    /// Fails with [`FormulaError::EmptyInput`] on blank input, with
    /// [`FormulaError::MalformedInput`] if the input cannot be reduced to a single step, and with
    /// one of the rule diagnostics of [`FormulaError`] on rules that cannot terminate.
    ///
    /// ```
    /// use hyformula::{config::FormulaConfig, rule::Rule, sequence::{Operand, Sequence}};
    ///
    /// let rules = [
    ///     Rule::new(2, r"([^\s]+) \* ([^\s]+)").unwrap(),
    ///     Rule::new(2, r"([^\s]+) \+ ([^\s]+)").unwrap(),
    /// ];
    /// let seq = Sequence::build("2 + 3 * 4", &rules, &FormulaConfig::default()).unwrap();
    /// assert_eq!(seq.len(), 2);
    /// assert_eq!(seq.root().unwrap().operands[1], Operand::Reference(0));
    /// ```
    pub fn build(text: &str, rules: &[Rule], config: &FormulaConfig) -> FormulaResult<Self> {
        let (reduced, table) = Reducer::new(rules, config).run(text)?;
        let root = reduced.as_operand()?;
        let aliases = table.into_aliases();

        match root {
            Operand::Literal(_) if aliases.is_empty() => {}
            Operand::Reference(id) if id + 1 == aliases.len() => {}
            _ => {
                return Err(FormulaError::InternalInconsistency {
                    reason: format!(
                        "`{}` does not reduce to the last of {} discovered alias(es)",
                        reduced.text(),
                        aliases.len()
                    ),
                });
            }
        }

        let steps = aliases
            .into_iter()
            .enumerate()
            .map(|(id, alias)| Step::from_alias(id, alias, rules))
            .collect::<FormulaResult<Vec<_>>>()?;

        debug!(
            "built sequence of {} step(s) from `{}` with {} rule(s)",
            steps.len(),
            text,
            rules.len()
        );
        Ok(Self { steps })
    }

    /// Final step, computing the value of the whole formula.
    #[inline]
    pub fn root(&self) -> Option<&Step> {
        self.steps.last()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&Step> {
        self.steps.get(id)
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Literal operands of every step, deduplicated by text in first-seen order.
    ///
    /// This reports every external symbol the formula mentions, including symbols only used by
    /// steps the root does not depend on.
    pub fn external_dependencies(&self) -> Vec<&Operand> {
        let mut seen = HashSet::new();
        let mut dependencies = Vec::new();
        for operand in self.steps.iter().flat_map(|step| step.operands.iter()) {
            if let Some(text) = operand.try_as_literal_ref() {
                if seen.insert(text) {
                    dependencies.push(operand);
                }
            }
        }
        dependencies
    }
}

impl Index<usize> for Sequence {
    type Output = Step;

    fn index(&self, id: usize) -> &Self::Output {
        &self.steps[id]
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{}", step)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arithmetic() -> Vec<Rule> {
        vec![
            Rule::new(1, r"\(([^\(\)]+)\)").unwrap(),
            Rule::new(2, r"([^\s]+) \* ([^\s]+)").unwrap(),
            Rule::new(2, r"([^\s]+) \/ ([^\s]+)").unwrap(),
            Rule::new(2, r"([^\s]+) \+ ([^\s]+)").unwrap(),
            Rule::new(2, r"([^\s]+) \- ([^\s]+)").unwrap(),
        ]
    }

    #[test]
    fn step_display_lists_literals_and_references() {
        let seq = Sequence::build("x + (y)", &arithmetic(), &FormulaConfig::default()).unwrap();
        assert_eq!(seq[0].to_string(), "Step #0. Depends on: y(String)");
        assert_eq!(
            seq[1].to_string(),
            "Step #1. Depends on: x(String); step #0"
        );
        assert_eq!(
            seq.to_string(),
            "Step #0. Depends on: y(String)\nStep #1. Depends on: x(String); step #0\n"
        );
    }

    #[test]
    fn steps_remember_their_rule_and_source() {
        let rules = arithmetic();
        let seq = Sequence::build("a - b / c", &rules, &FormulaConfig::default()).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0].rule, rules[2]);
        assert_eq!(seq[0].action, 2);
        assert_eq!(seq[0].source, "b / c");
        assert_eq!(seq[1].action, 4);
        assert_eq!(seq[1].source, "a - ALIAS_0");
        assert_eq!(seq[1].references().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn custom_prefix_shows_up_in_sources() {
        let config = FormulaConfig::default().alias_prefix("R");
        let seq = Sequence::build("(a) * b", &arithmetic(), &config).unwrap();
        assert_eq!(seq[1].source, "R0 * b");
    }

    #[test]
    fn partially_reduced_input_is_malformed() {
        let err = Sequence::build("a + b c", &arithmetic(), &FormulaConfig::default())
            .unwrap_err();
        assert!(err.is_malformed_input(), "unexpected error: {err}");
    }
}
