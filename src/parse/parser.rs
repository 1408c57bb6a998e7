use crate::Rule;

/// The rules read from one piece of rule notation, in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRules {
    pub rules: Vec<Rule>,
}

impl ParsedRules {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl IntoIterator for ParsedRules {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}
