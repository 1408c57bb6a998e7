use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// A node is missing a child its name requires (an `if` without `then`,
    /// a `repeat` without `body`), or a structural name was used for a plain
    /// action. Indicates a bug in whoever built the tree.
    #[error("malformed rule tree: '{node}' node {problem}")]
    MalformedRuleTree { node: String, problem: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

impl EditError {
    pub(crate) fn missing_child(node: &str, child: &str) -> Self {
        EditError::MalformedRuleTree {
            node: node.to_owned(),
            problem: format!("is missing its '{child}' branch"),
        }
    }

    pub(crate) fn child_not_a_node(node: &str, child: &str) -> Self {
        EditError::MalformedRuleTree {
            node: node.to_owned(),
            problem: format!("has a '{child}' branch that is not a node"),
        }
    }

    pub(crate) fn reserved_name(node: &str) -> Self {
        EditError::MalformedRuleTree {
            node: node.to_owned(),
            problem: "cannot be built without its nested branches".to_owned(),
        }
    }
}
