//! The [`Formula`] facade: an expression, its rule list and the engine configuration.
use crate::{
    config::FormulaConfig,
    error::{FormulaError, FormulaResult},
    eval::{Handlers, evaluate},
    rule::Rule,
    sequence::{Operand, Sequence},
};

/// An expression to reduce, together with the rules that give it meaning.
///
/// Every operation is a pure function of the text, the rules and the configuration. Replacing
/// the text with [`Formula::set_text`] is the intended way of reusing the same rules for a new
/// input.
///
/// ```
/// use hyformula::{error::FormulaError, eval::Handlers, formula::Formula, rule::Rule};
///
/// let brackets = Rule::new(1, r"\(([^\(\)]+)\)").unwrap();
/// let plus = Rule::new(2, r"([^\s]+) \+ ([^\s]+)").unwrap();
/// let handlers = Handlers::new()
///     .identity(&brackets)
///     .with_fn(&plus, |v: &[f64]| Ok(v[0] + v[1]));
/// let convert = |s: &str| {
///     s.parse::<f64>()
///         .map_err(|_| FormulaError::MalformedInput { text: s.to_string() })
/// };
///
/// let mut formula = Formula::new("1 + 2", vec![brackets, plus]);
/// assert_eq!(formula.calculate(convert, &handlers), Ok(3.0));
///
/// formula.set_text("(1 + 2) + 4");
/// assert_eq!(formula.calculate(convert, &handlers), Ok(7.0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    text: String,
    rules: Vec<Rule>,
    config: FormulaConfig,
}

impl Formula {
    /// `rules` must be listed from the highest to the lowest priority.
    pub fn new(text: impl Into<String>, rules: impl Into<Vec<Rule>>) -> Self {
        Self::with_config(text, rules, FormulaConfig::default())
    }

    pub fn with_config(
        text: impl Into<String>,
        rules: impl Into<Vec<Rule>>,
        config: FormulaConfig,
    ) -> Self {
        Self {
            text: text.into(),
            rules: rules.into(),
            config,
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    #[inline]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[inline]
    pub fn config(&self) -> &FormulaConfig {
        &self.config
    }

    /// Build the step sequence of the current text. See [`Sequence::build`].
    pub fn sequence(&self) -> FormulaResult<Sequence> {
        Sequence::build(&self.text, &self.rules, &self.config)
    }

    /// Position of `rule` in the rule list.
    pub fn action_index(&self, rule: &Rule) -> FormulaResult<usize> {
        self.rules
            .iter()
            .position(|r| r == rule)
            .ok_or_else(|| FormulaError::UnknownRule {
                pattern: rule.source().to_string(),
            })
    }

    /// Literal operands of the whole sequence, deduplicated by text.
    pub fn external_dependencies(&self) -> FormulaResult<Vec<Operand>> {
        let sequence = self.sequence()?;
        Ok(sequence
            .external_dependencies()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Build the sequence and evaluate it. See [`evaluate`].
    pub fn calculate<T, E, C>(&self, converter: C, handlers: &Handlers<'_, T, E>) -> Result<T, E>
    where
        T: Clone,
        E: From<FormulaError>,
        C: Fn(&str) -> Result<T, E>,
    {
        let sequence = self.sequence()?;
        evaluate(&sequence, handlers, converter)
    }
}
