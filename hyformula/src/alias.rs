//! Aliasing engine.
//!
//! Reduces an expression string into a table of deduplicated sub-expressions ("aliases").
//! Rules are applied in priority order, each one exhaustively before the next is attempted.
//! Every match is replaced in the working string by an alias token (`prefix + id`), after its
//! captures have been reduced recursively with the full rule list.
//!
//! Alias tokens are tracked by byte span rather than recognized by their text, so user input
//! that happens to look like a token is never mistaken for one. Operands are classified while
//! matching: a capture is a reference iff it is exactly one tracked token (modulo surrounding
//! whitespace), and a literal iff it contains no token at all.
//!
//! Recursion depth is bounded by the nesting depth of captures in the input, not by its length.
use std::{collections::HashMap, ops::Range};

use log::trace;
use smallvec::SmallVec;

use crate::{
    config::FormulaConfig,
    error::{FormulaError, FormulaResult},
    rule::{PatternMatch, Rule},
    sequence::Operand,
};

/// A discovered sub-expression together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Alias {
    /// Matched text with every capture replaced by its reduced form.
    pub text: String,
    /// Index of the producing rule in the rule list.
    pub action: usize,
    pub operands: SmallVec<[Operand; 4]>,
}

/// Ordered, deduplicated list of aliases. Index = alias id = step id.
#[derive(Debug, Default)]
pub(crate) struct AliasTable {
    aliases: Vec<Alias>,
    lookup: HashMap<Alias, usize>,
}

impl AliasTable {
    /// Return the id of `alias`, appending it if it was never seen. The flag is `true` for a
    /// fresh alias.
    fn intern(&mut self, alias: Alias) -> (usize, bool) {
        if let Some(&id) = self.lookup.get(&alias) {
            return (id, false);
        }

        let id = self.aliases.len();
        self.lookup.insert(alias.clone(), id);
        self.aliases.push(alias);
        (id, true)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn into_aliases(self) -> Vec<Alias> {
        self.aliases
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    start: usize,
    end: usize,
    alias: usize,
}

impl Token {
    #[inline]
    fn covers(&self, range: &Range<usize>) -> bool {
        self.start == range.start && self.end == range.end
    }
}

/// A string under reduction and the positions of the alias tokens substituted into it.
///
/// `tokens` is kept sorted by start offset and never overlaps.
#[derive(Debug, Clone, Default)]
pub(crate) struct Working {
    text: String,
    tokens: Vec<Token>,
}

impl Working {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            tokens: Vec::new(),
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    fn slice(&self, range: Range<usize>) -> Self {
        Self {
            text: self.text[range.clone()].to_string(),
            tokens: self
                .tokens
                .iter()
                .filter(|t| range.start <= t.start && t.end <= range.end)
                .map(|t| Token {
                    start: t.start - range.start,
                    end: t.end - range.start,
                    alias: t.alias,
                })
                .collect(),
        }
    }

    /// True if `range` is a valid, char-aligned slice of the text.
    fn contains(&self, range: &Range<usize>) -> bool {
        range.start <= range.end
            && self.text.is_char_boundary(range.start)
            && self.text.is_char_boundary(range.end)
    }

    /// True if some token straddles a boundary of `range`.
    fn splits(&self, range: &Range<usize>) -> bool {
        self.tokens.iter().any(|t| {
            let overlaps = t.start < range.end && range.start < t.end;
            let inside = range.start <= t.start && t.end <= range.end;
            overlaps && !inside
        })
    }

    fn token_at(&self, range: &Range<usize>) -> Option<usize> {
        self.tokens
            .iter()
            .find(|t| t.covers(range))
            .map(|t| t.alias)
    }

    /// Replace `range` by the token of `alias`. Tokens inside `range` are dropped.
    fn replace(&mut self, range: Range<usize>, alias: usize, prefix: &str) {
        let token = format!("{prefix}{alias}");
        let delta = token.len() as isize - range.len() as isize;

        self.text.replace_range(range.clone(), &token);
        self.tokens
            .retain(|t| t.end <= range.start || t.start >= range.end);
        for t in self.tokens.iter_mut().filter(|t| t.start >= range.end) {
            t.start = t.start.wrapping_add_signed(delta);
            t.end = t.end.wrapping_add_signed(delta);
        }

        let at = self.tokens.partition_point(|t| t.start < range.start);
        self.tokens.insert(
            at,
            Token {
                start: range.start,
                end: range.start + token.len(),
                alias,
            },
        );
    }

    /// Interpret the whole string as a single operand.
    ///
    /// A string without tokens is a literal, kept verbatim. A string made of exactly one token,
    /// possibly padded with whitespace, is a reference. Anything else was only partially reduced.
    pub fn as_operand(&self) -> FormulaResult<Operand> {
        if self.tokens.is_empty() {
            return Ok(Operand::Literal(self.text.clone()));
        }

        let trimmed = self.text.trim();
        let start = self.text.len() - self.text.trim_start().len();
        let span = start..start + trimmed.len();
        match self.tokens.as_slice() {
            [token] if token.covers(&span) => Ok(Operand::Reference(token.alias)),
            _ => Err(FormulaError::MalformedInput {
                text: self.text.clone(),
            }),
        }
    }
}

/// One reduction pass over an expression. Owns the alias table it fills.
pub(crate) struct Reducer<'a> {
    rules: &'a [Rule],
    config: &'a FormulaConfig,
    table: AliasTable,
    reductions: usize,
}

impl<'a> Reducer<'a> {
    pub fn new(rules: &'a [Rule], config: &'a FormulaConfig) -> Self {
        Self {
            rules,
            config,
            table: AliasTable::default(),
            reductions: 0,
        }
    }

    /// Reduce `text` as far as the rules allow. Returns the final form and the discovered aliases.
    pub fn run(mut self, text: &str) -> FormulaResult<(Working, AliasTable)> {
        if text.trim().is_empty() {
            return Err(FormulaError::EmptyInput);
        }

        let reduced = self.reduce(Working::new(text))?;
        Ok((reduced, self.table))
    }

    fn reduce(&mut self, mut work: Working) -> FormulaResult<Working> {
        let rules = self.rules;
        for (action, rule) in rules.iter().enumerate() {
            while let Some(found) = rule.find(&work.text) {
                self.substitute(&mut work, action, rule, found)?;
            }
        }
        Ok(work)
    }

    fn substitute(
        &mut self,
        work: &mut Working,
        action: usize,
        rule: &Rule,
        found: PatternMatch,
    ) -> FormulaResult<()> {
        let PatternMatch { span, captures } = found;

        // Ranges come from a pluggable pattern engine and are checked before slicing.
        let out_of_bounds = std::iter::once(&span)
            .chain(captures.iter().flatten())
            .find(|range| !work.contains(range));
        if let Some(range) = out_of_bounds {
            return Err(FormulaError::InternalInconsistency {
                reason: format!(
                    "rule `{}` reported range {:?} outside of `{}`",
                    rule.source(),
                    range,
                    work.text
                ),
            });
        }

        // A match that consumes nothing new would be found again forever.
        if span.is_empty() || work.token_at(&span).is_some() {
            return Err(FormulaError::NonConvergingRule {
                pattern: rule.source().to_string(),
                text: work.text[span.clone()].to_string(),
            });
        }
        if work.splits(&span) {
            return Err(FormulaError::AliasTokenSplit {
                pattern: rule.source().to_string(),
                text: work.text.clone(),
            });
        }
        if captures.len() != rule.operand_count() {
            return Err(FormulaError::InternalInconsistency {
                reason: format!(
                    "rule `{}` yielded {} capture(s) for {} operand(s)",
                    rule.source(),
                    captures.len(),
                    rule.operand_count()
                ),
            });
        }

        self.reductions += 1;
        if self.reductions > self.config.limit() {
            return Err(FormulaError::ReductionLimit {
                limit: self.config.limit(),
            });
        }

        let mut text = String::with_capacity(span.len());
        let mut operands = SmallVec::new();
        let mut cursor = span.start;
        for capture in captures {
            let Some(capture) = capture else {
                operands.push(Operand::Literal(String::new()));
                continue;
            };

            if capture.start < cursor || capture.end > span.end {
                return Err(FormulaError::OverlappingCaptures {
                    pattern: rule.source().to_string(),
                    text: work.text[span.clone()].to_string(),
                });
            }
            if capture == span {
                return Err(FormulaError::NonConvergingRule {
                    pattern: rule.source().to_string(),
                    text: work.text[span.clone()].to_string(),
                });
            }
            if work.splits(&capture) {
                return Err(FormulaError::AliasTokenSplit {
                    pattern: rule.source().to_string(),
                    text: work.text.clone(),
                });
            }

            text.push_str(&work.text[cursor..capture.start]);
            let (operand, reduced) = self.reduce_operand(work.slice(capture.clone()))?;
            text.push_str(&reduced);
            operands.push(operand);
            cursor = capture.end;
        }
        text.push_str(&work.text[cursor..span.end]);

        let (id, fresh) = self.table.intern(Alias {
            text,
            action,
            operands,
        });
        trace!(
            "rule #{} matched `{}` -> {}{} ({})",
            action,
            &work.text[span.clone()],
            self.config.prefix(),
            id,
            if fresh { "new" } else { "shared" }
        );

        work.replace(span, id, self.config.prefix());
        Ok(())
    }

    /// Reduce a captured piece and classify it. Returns the operand and the reduced text.
    fn reduce_operand(&mut self, piece: Working) -> FormulaResult<(Operand, String)> {
        // An alias token is already fully reduced.
        let reduced = match piece.as_operand() {
            Ok(Operand::Reference(_)) => piece,
            _ if piece.text.is_empty() => piece,
            _ => self.reduce(piece)?,
        };

        let operand = reduced.as_operand()?;
        Ok((operand, reduced.text))
    }
}
