use std::sync::Arc;

use super::node::{Response, Trigger};

/// A trigger plus the list of responses it runs.
///
/// Rules are plain values: editing one with [`Rule::apply`] returns a new
/// rule and leaves the original valid, sharing every untouched node with it.
/// A freshly created rule has no trigger and no responses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    pub trigger: Option<Trigger>,
    pub response: Option<Arc<Response>>,
}

impl Rule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn with_response(mut self, response: impl Into<Arc<Response>>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Rule with `trigger` in place of the current one. Responses are shared.
    #[must_use]
    pub fn set_trigger(&self, trigger: Option<Trigger>) -> Rule {
        Rule {
            trigger,
            response: self.response.clone(),
        }
    }

    /// Rule with `response` as its whole response list.
    #[must_use]
    pub fn set_response(&self, response: Option<Arc<Response>>) -> Rule {
        Rule {
            trigger: self.trigger.clone(),
            response,
        }
    }

    #[must_use]
    pub fn trigger_name(&self) -> Option<&str> {
        self.trigger.as_ref().map(|t| t.name.as_str())
    }

    /// `true` when there is nothing to run.
    #[must_use]
    pub fn has_no_responses(&self) -> bool {
        self.response.is_none()
    }

    /// Pre-order walk over every response node. See [`Response::visit`].
    pub fn visit(&self, f: impl FnMut(&Response, usize)) {
        if let Some(head) = &self.response {
            head.visit(f);
        }
    }

    /// Number of response nodes in the rule, nested ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.response.as_deref().map_or(0, Response::node_count)
    }

    /// Names of the top-level responses in order.
    #[must_use]
    pub fn top_level_names(&self) -> Vec<&str> {
        self.response
            .as_deref()
            .map(Response::chain_names)
            .unwrap_or_default()
    }
}
