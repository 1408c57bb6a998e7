use thiserror::Error;

/// Errors produced when parsing rule notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `line` and `column` are 1-based; `column` counts characters.
    #[error("parse error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("parse error: expected exactly one rule, found {found}")]
    RuleCount { found: usize },
}

impl ParseError {
    /// A syntax error at byte `offset` of `input`.
    pub(crate) fn at(input: &str, offset: usize, message: impl Into<String>) -> Self {
        let before = input.get(..offset).unwrap_or(input);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let mut message = message.into();
        if message.is_empty() {
            message = "unexpected input".to_owned();
        }
        ParseError::Syntax {
            line,
            column: before[line_start..].chars().count() + 1,
            message,
        }
    }
}
