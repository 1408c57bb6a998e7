mod error;
mod grammar;
mod parser;
mod printer;

pub use error::ParseError;
pub use parser::ParsedRules;

use crate::error::RuleGraphError;
use crate::Rule;

/// Parse rule notation into one or more [`Rule`]s.
///
/// # Errors
///
/// Returns [`ParseError::Syntax`] with the line and column of the first
/// problem if the input is not valid rule notation.
pub fn parse(input: &str) -> Result<ParsedRules, ParseError> {
    use winnow::Parser;
    grammar::parse_rules
        .parse(input)
        .map_err(|e| ParseError::at(input, e.offset(), e.inner().to_string()))
}

impl Rule {
    /// Parse a single rule written in rule notation.
    ///
    /// The notation is what [`Display`](std::fmt::Display) prints, so
    /// `Rule::from_dsl(&rule.to_string())` gives back an equal rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleGraphError::Parse`] if the input is not valid notation
    /// or does not hold exactly one rule.
    pub fn from_dsl(input: &str) -> Result<Self, RuleGraphError> {
        let parsed = parse(input)?;
        let found = parsed.rules.len();
        let mut rules = parsed.rules.into_iter();
        match (rules.next(), found) {
            (Some(rule), 1) => Ok(rule),
            _ => Err(ParseError::RuleCount { found }.into()),
        }
    }

    /// Read a file holding a single rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleGraphError`] on I/O or parse failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, RuleGraphError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }
}
