use strum::EnumIs;
use thiserror::Error;

/// Errors surfaced by rule construction, sequence building and evaluation.
///
/// Nothing is retried internally: every failure reaches the immediate caller
/// and no partial [`Sequence`](crate::sequence::Sequence) or value is produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, Error)]
pub enum FormulaError {
    /// The pattern of a rule does not expose as many capture groups as the rule has operands.
    #[error(
        "Rule `{pattern}` declares {expected} operand(s) but its pattern has {found} capture group(s)."
    )]
    MalformedRule {
        pattern: String,
        expected: usize,
        found: usize,
    },

    /// The pattern source of a rule could not be compiled.
    #[error("Rule pattern `{pattern}` is not a valid pattern: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Some part of the input could not be reduced to a single operand.
    #[error("Malformed input: `{text}` cannot be reduced to a single operand by any rule.")]
    MalformedInput { text: String },

    /// The input is empty or consists only of whitespace.
    #[error("Cannot build a sequence from an empty expression.")]
    EmptyInput,

    /// An invariant of the engine was violated. This is a bug, not an input problem.
    #[error("Internal inconsistency: {reason}")]
    InternalInconsistency { reason: String },

    /// A rule matched only part of an alias token injected by the engine.
    #[error(
        "Rule `{pattern}` split an alias token while matching `{text}`. Choose an alias prefix the rules match as a whole operand."
    )]
    AliasTokenSplit { pattern: String, text: String },

    /// A rule matched without consuming anything new, so reduction would never terminate.
    #[error("Rule `{pattern}` does not shrink its match `{text}`; reduction would not terminate.")]
    NonConvergingRule { pattern: String, text: String },

    /// Two capture groups of a rule overlap, so operands cannot be spliced back.
    #[error("Rule `{pattern}` produced overlapping captures while matching `{text}`.")]
    OverlappingCaptures { pattern: String, text: String },

    /// The configured substitution budget was exhausted.
    #[error("Reduction exceeded the limit of {limit} substitutions.")]
    ReductionLimit { limit: usize },

    /// There is nothing to evaluate.
    #[error("Cannot evaluate an empty sequence.")]
    EmptySequence,

    /// No rule (or no handler) is registered for the given pattern.
    #[error("No rule or handler is registered for pattern `{pattern}`.")]
    UnknownRule { pattern: String },

    /// A handler received a number of operands it cannot work with.
    #[error("Handler for `{pattern}` expects {expected} operand(s) but received {found}.")]
    ArityMismatch {
        pattern: String,
        expected: usize,
        found: usize,
    },
}

pub type FormulaResult<T> = Result<T, FormulaError>;
