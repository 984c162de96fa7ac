//! Hyformula: a semantics-agnostic, rule-driven formula engine.
//!
//! The engine knows nothing about `+` or `AND`. All operator knowledge is injected as an
//! ordered list of [`Rule`](rule::Rule)s, each one a pattern with one capture group per
//! operand. Working with a formula happens in two phases:
//!
//!  1. Build: the expression is reduced rule by rule (highest priority first, each rule
//!     exhaustively) into a [`Sequence`](sequence::Sequence) of steps. Identical
//!     sub-expressions share a single step, and steps only ever refer to earlier steps.
//!  2. Evaluate: the sequence is walked front to back with a caller-supplied literal converter
//!     and one [`Action`](eval::Action) per rule, producing the value of the last step.
//!
//! Both phases are synchronous and allocate no shared state, so independent formulas can be
//! built and evaluated from any number of threads.
//!
//! Resource bound: reduction recurses once per level of nested captures (e.g. nested
//! parentheses). Very deeply nested input is the only source of stack growth.
//!
//! Example
//! ```
//! use hyformula::prelude::*;
//!
//! let brackets = Rule::new(1, r"\(([^\(\)]+)\)").unwrap();
//! let not = Rule::new(1, r"\!([^\s]+)").unwrap();
//! let and = Rule::new(2, r"([^\s]+) \& ([^\s]+)").unwrap();
//! let or = Rule::new(2, r"([^\s]+) \| ([^\s]+)").unwrap();
//!
//! let formula = Formula::new("a & !(b | a)", vec![brackets, not, and, or]);
//! let sequence = formula.sequence().unwrap();
//! assert_eq!(sequence.len(), 4);
//!
//! let symbols: Vec<_> = formula
//!     .external_dependencies()
//!     .unwrap()
//!     .into_iter()
//!     .filter_map(|o| o.try_as_literal())
//!     .collect();
//! assert_eq!(symbols, ["b", "a"]);
//! ```

/// Aliasing engine: recursive, deduplicating reduction of an expression string.
mod alias;
/// Engine configuration.
pub mod config;
/// Error type shared by every operation of the crate.
pub mod error;
/// Generic evaluator and rule-to-action lookup tables.
pub mod eval;
/// The `Formula` facade.
pub mod formula;
/// Rules and the pattern capability they rely on.
pub mod rule;
/// Steps, operands and sequences.
pub mod sequence;

pub mod prelude {
    //! Convenient re-exports for end users.
    pub use crate::config::FormulaConfig;
    pub use crate::error::{FormulaError, FormulaResult};
    pub use crate::eval::{Action, Handlers, evaluate};
    pub use crate::formula::Formula;
    pub use crate::rule::{Pattern, PatternMatch, Rule};
    pub use crate::sequence::{Operand, Sequence, Step};
}
