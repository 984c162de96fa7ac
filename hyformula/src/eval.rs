//! Generic, single-pass evaluation of a [`Sequence`].
//!
//! The engine does not know what any rule means. The caller provides a literal converter,
//! turning raw operand text into a value, and a [`Handlers`] table mapping each rule to the
//! [`Action`] computing its value from the values of its operands. Steps are evaluated front to
//! back and each step is computed exactly once, so shared sub-expressions are never recomputed.
//!
//! ```
//! use hyformula::{config::FormulaConfig, error::FormulaError, eval::{evaluate, Handlers}};
//! use hyformula::{rule::Rule, sequence::Sequence};
//!
//! let brackets = Rule::new(1, r"\(([^\(\)]+)\)").unwrap();
//! let times = Rule::new(2, r"([^\s]+) \* ([^\s]+)").unwrap();
//! let plus = Rule::new(2, r"([^\s]+) \+ ([^\s]+)").unwrap();
//! let rules = [brackets.clone(), times.clone(), plus.clone()];
//!
//! let handlers = Handlers::new()
//!     .identity(&brackets)
//!     .with_fn(&times, |v: &[i64]| Ok(v[0] * v[1]))
//!     .with_fn(&plus, |v: &[i64]| Ok(v[0] + v[1]));
//!
//! let seq = Sequence::build("2 * (3 + 4)", &rules, &FormulaConfig::default()).unwrap();
//! let value = evaluate(&seq, &handlers, |s: &str| {
//!     s.parse::<i64>().map_err(|_| FormulaError::MalformedInput { text: s.to_string() })
//! });
//! assert_eq!(value, Ok(14));
//! ```
use std::{collections::HashMap, fmt};

use log::{debug, trace};
use smallvec::SmallVec;

use crate::{
    error::FormulaError,
    rule::Rule,
    sequence::{Operand, Sequence},
};

pub type HandlerFn<'a, T, E> = Box<dyn Fn(&[T]) -> Result<T, E> + 'a>;

/// What to do with the operand values of a step.
pub enum Action<'a, T, E> {
    /// Forward the single operand unchanged, e.g. for parentheses.
    Identity,
    /// Compute the value of the step from its operand values, in capture order.
    Apply(HandlerFn<'a, T, E>),
}

impl<'a, T, E> Action<'a, T, E> {
    pub fn apply<F>(handler: F) -> Self
    where
        F: Fn(&[T]) -> Result<T, E> + 'a,
    {
        Action::Apply(Box::new(handler))
    }

    fn invoke(&self, rule: &Rule, operands: &[T]) -> Result<T, E>
    where
        T: Clone,
        E: From<FormulaError>,
    {
        match self {
            Action::Identity => match operands {
                [value] => Ok(value.clone()),
                _ => Err(FormulaError::ArityMismatch {
                    pattern: rule.source().to_string(),
                    expected: 1,
                    found: operands.len(),
                }
                .into()),
            },
            Action::Apply(handler) => handler(operands),
        }
    }
}

impl<T, E> fmt::Debug for Action<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Identity => f.write_str("Identity"),
            Action::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// Lookup table from rules to the actions evaluating them.
///
/// Rules are matched by identity (pattern source), so the table does not depend on the order
/// of the rule list a sequence was built with.
pub struct Handlers<'a, T, E> {
    table: HashMap<Rule, Action<'a, T, E>>,
}

impl<'a, T, E> Handlers<'a, T, E> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Pair `rules` and `actions` by position.
    ///
    /// Extra entries on either side are ignored; a rule left without an action fails with
    /// [`FormulaError::UnknownRule`] once a step using it is evaluated.
    pub fn from_parallel<I>(rules: &[Rule], actions: I) -> Self
    where
        I: IntoIterator<Item = Action<'a, T, E>>,
    {
        Self {
            table: rules.iter().cloned().zip(actions).collect(),
        }
    }

    /// Register `action` for `rule`, returning the action it replaces.
    pub fn insert(&mut self, rule: &Rule, action: Action<'a, T, E>) -> Option<Action<'a, T, E>> {
        self.table.insert(rule.clone(), action)
    }

    pub fn with(mut self, rule: &Rule, action: Action<'a, T, E>) -> Self {
        self.insert(rule, action);
        self
    }

    pub fn with_fn<F>(self, rule: &Rule, handler: F) -> Self
    where
        F: Fn(&[T]) -> Result<T, E> + 'a,
    {
        self.with(rule, Action::apply(handler))
    }

    pub fn identity(self, rule: &Rule) -> Self {
        self.with(rule, Action::Identity)
    }

    #[inline]
    pub fn get(&self, rule: &Rule) -> Option<&Action<'a, T, E>> {
        self.table.get(rule)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<T, E> Default for Handlers<'_, T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Handlers<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.table.iter().map(|(rule, action)| (rule.source(), action)))
            .finish()
    }
}

/// Evaluate `sequence` and return the value of its root step.
///
/// Fails with [`FormulaError::EmptySequence`] if there is nothing to evaluate and with
/// [`FormulaError::UnknownRule`] if a step's rule has no registered action. Errors returned by
/// `converter` or by a handler are propagated unchanged.
pub fn evaluate<T, E, C>(
    sequence: &Sequence,
    handlers: &Handlers<'_, T, E>,
    converter: C,
) -> Result<T, E>
where
    T: Clone,
    E: From<FormulaError>,
    C: Fn(&str) -> Result<T, E>,
{
    if sequence.is_empty() {
        return Err(FormulaError::EmptySequence.into());
    }

    debug!("evaluating sequence of {} step(s)", sequence.len());
    let mut values: Vec<T> = Vec::with_capacity(sequence.len());
    for step in sequence {
        let mut operands: SmallVec<[T; 4]> = SmallVec::with_capacity(step.operands.len());
        for operand in &step.operands {
            let value = match operand {
                Operand::Literal(text) => converter(text)?,
                Operand::Reference(id) => values
                    .get(*id)
                    .filter(|_| *id < step.id)
                    .cloned()
                    .ok_or_else(|| FormulaError::InternalInconsistency {
                        reason: format!("step #{} references step #{}", step.id, id),
                    })?,
            };
            operands.push(value);
        }

        let action = handlers
            .get(&step.rule)
            .ok_or_else(|| FormulaError::UnknownRule {
                pattern: step.rule.source().to_string(),
            })?;
        trace!("evaluating step #{} with `{}`", step.id, step.rule.source());
        values.push(action.invoke(&step.rule, &operands)?);
    }

    values.pop().ok_or_else(|| FormulaError::EmptySequence.into())
}
