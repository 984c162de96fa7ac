/// Tunables of the aliasing engine.
///
/// ```
/// use hyformula::config::FormulaConfig;
///
/// let config = FormulaConfig::default().alias_prefix("REF_").max_reductions(128);
/// assert_eq!(config.prefix(), "REF_");
/// assert_eq!(config.limit(), 128);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormulaConfig {
    alias_prefix: String,
    max_reductions: usize,
}

impl FormulaConfig {
    pub const DEFAULT_ALIAS_PREFIX: &'static str = "ALIAS_";
    pub const DEFAULT_MAX_REDUCTIONS: usize = 1 << 16;

    /// Textual prefix of the alias tokens substituted into the working string.
    ///
    /// Tokens are tracked by position, so input that merely looks like a token stays a literal.
    /// The prefix must however be something the rules accept as a whole operand.
    pub fn alias_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.alias_prefix = prefix.into();
        self
    }

    /// Maximum number of substitutions a single build may perform before failing.
    pub fn max_reductions(mut self, limit: usize) -> Self {
        self.max_reductions = limit;
        self
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.alias_prefix
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.max_reductions
    }
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            alias_prefix: Self::DEFAULT_ALIAS_PREFIX.to_string(),
            max_reductions: Self::DEFAULT_MAX_REDUCTIONS,
        }
    }
}
