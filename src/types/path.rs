use std::fmt;
use std::str::FromStr;

use super::error::EditError;

/// One move from a response node to a linked position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Next,
    Then,
    Else,
    Body,
}

impl Step {
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Step::Next => "next",
            Step::Then => "then",
            Step::Else => "else",
            Step::Body => "body",
        }
    }

    /// Whether the step descends into a nested list.
    #[must_use]
    pub fn is_nested(self) -> bool {
        !matches!(self, Step::Next)
    }
}

/// Position of a response inside a rule, starting at the rule's first
/// response.
///
/// Nodes have no identity of their own, so a position is all an edit needs
/// to name its target. The empty path is the head of the top-level list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResponsePath {
    steps: Vec<Step>,
}

impl ResponsePath {
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// The `index`-th response of the top-level list.
    #[must_use]
    pub fn at(index: usize) -> Self {
        Self {
            steps: vec![Step::Next; index],
        }
    }

    #[must_use]
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn next(self) -> Self {
        self.push(Step::Next)
    }

    #[must_use]
    pub fn then(self) -> Self {
        self.push(Step::Then)
    }

    #[must_use]
    pub fn otherwise(self) -> Self {
        self.push(Step::Else)
    }

    #[must_use]
    pub fn body(self) -> Self {
        self.push(Step::Body)
    }

    /// `count` successive `next` steps.
    #[must_use]
    pub fn skip(mut self, count: usize) -> Self {
        self.steps.extend(std::iter::repeat(Step::Next).take(count));
        self
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// How many lists deep the position is (0 for the top-level list).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.steps.iter().filter(|s| s.is_nested()).count()
    }
}

impl fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("response")?;
        for step in &self.steps {
            write!(f, ".{}", step.key())?;
        }
        Ok(())
    }
}

impl FromStr for ResponsePath {
    type Err = EditError;

    /// Parses the [`Display`](fmt::Display) form; the leading `response`
    /// segment is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();
        for (i, segment) in s.split('.').filter(|seg| !seg.is_empty()).enumerate() {
            let step = match segment {
                "response" if i == 0 => continue,
                "next" => Step::Next,
                "then" => Step::Then,
                "else" => Step::Else,
                "body" => Step::Body,
                other => {
                    return Err(EditError::InvalidPath {
                        path: s.to_owned(),
                        reason: format!("unknown step '{other}'"),
                    });
                }
            };
            steps.push(step);
        }
        Ok(Self { steps })
    }
}
