//! Operator rules and the pattern capability they are matched with.
//!
//! A [`Rule`] pairs an operand count with a [`Pattern`] exposing exactly that many
//! capture groups. The engine never inspects patterns itself; it only asks them for
//! the leftmost match in a string and the byte ranges of their captures.
//!
//! ```
//! use hyformula::rule::Rule;
//!
//! let plus = Rule::new(2, r"([^\s]+) \+ ([^\s]+)").unwrap();
//! assert_eq!(plus.operand_count(), 2);
//!
//! // One capture group for two operands is rejected.
//! assert!(Rule::new(2, r"\(([^()]+)\)").unwrap_err().is_malformed_rule());
//! ```
use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
    sync::Arc,
};

use regex::Regex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{FormulaError, FormulaResult};

/// Leftmost match of a [`Pattern`] inside a haystack.
///
/// All ranges are byte offsets into the haystack that was searched. Captures are listed in
/// group order; a group that did not participate in the match is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub span: Range<usize>,
    pub captures: SmallVec<[Option<Range<usize>>; 4]>,
}

/// Matching capability used by rules.
///
/// Implement this trait to plug a matching engine other than [`regex`] into a [`Rule`].
pub trait Pattern: fmt::Debug + Send + Sync {
    /// Source text of the pattern. Rules compare and hash by this text.
    fn source(&self) -> &str;

    /// Number of capture groups, not counting the implicit whole-match group.
    fn captures_len(&self) -> usize;

    /// Find the leftmost match in `haystack`.
    fn find(&self, haystack: &str) -> Option<PatternMatch>;
}

impl Pattern for Regex {
    fn source(&self) -> &str {
        self.as_str()
    }

    fn captures_len(&self) -> usize {
        Regex::captures_len(self) - 1
    }

    fn find(&self, haystack: &str) -> Option<PatternMatch> {
        let captures = self.captures(haystack)?;
        let span = captures.get(0)?.range();
        Some(PatternMatch {
            span,
            captures: captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.range()))
                .collect(),
        })
    }
}

/// A single operator definition: operand count and the pattern recognizing it.
///
/// Rules are immutable and cheap to clone. Two rules are equal iff their pattern sources are
/// equal, regardless of the declared operand count or the engine behind the pattern.
#[derive(Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "RuleRepr", into = "RuleRepr")
)]
pub struct Rule {
    operand_count: usize,
    pattern: Arc<dyn Pattern>,
}

impl Rule {
    /// Compile `source` as a regular expression and build a rule from it.
    ///
    /// Fails with [`FormulaError::InvalidPattern`] if the source does not compile and with
    /// [`FormulaError::MalformedRule`] if the number of capture groups is not `operand_count`.
    pub fn new(operand_count: usize, source: &str) -> FormulaResult<Self> {
        let regex = Regex::new(source).map_err(|e| FormulaError::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Self::with_pattern(operand_count, regex)
    }

    /// Build a rule from an already constructed pattern.
    pub fn with_pattern<P: Pattern + 'static>(
        operand_count: usize,
        pattern: P,
    ) -> FormulaResult<Self> {
        let found = pattern.captures_len();
        if found != operand_count {
            return Err(FormulaError::MalformedRule {
                pattern: pattern.source().to_string(),
                expected: operand_count,
                found,
            });
        }

        Ok(Self {
            operand_count,
            pattern: Arc::new(pattern),
        })
    }

    #[inline]
    pub fn operand_count(&self) -> usize {
        self.operand_count
    }

    #[inline]
    pub fn source(&self) -> &str {
        self.pattern.source()
    }

    #[inline]
    pub fn pattern(&self) -> &dyn Pattern {
        &*self.pattern
    }

    #[inline]
    pub(crate) fn find(&self, haystack: &str) -> Option<PatternMatch> {
        self.pattern.find(haystack)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source().hash(state);
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("operand_count", &self.operand_count)
            .field("pattern", &self.source())
            .finish()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source(), self.operand_count)
    }
}

/// Serialized form of a [`Rule`]. The pattern is recompiled as a regular expression on load.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RuleRepr {
    operand_count: usize,
    pattern: String,
}

#[cfg(feature = "serde")]
impl TryFrom<RuleRepr> for Rule {
    type Error = FormulaError;

    fn try_from(value: RuleRepr) -> Result<Self, Self::Error> {
        Rule::new(value.operand_count, &value.pattern)
    }
}

#[cfg(feature = "serde")]
impl From<Rule> for RuleRepr {
    fn from(value: Rule) -> Self {
        RuleRepr {
            operand_count: value.operand_count,
            pattern: value.source().to_string(),
        }
    }
}
