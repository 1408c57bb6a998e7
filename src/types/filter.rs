use std::collections::HashSet;

use super::entry::Entry;
use super::path::ResponsePath;
use super::rule::Rule;

/// What a picker knows about the position it is filling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterContext {
    /// Behaviors active on the actor that owns the rule.
    pub active_behaviors: HashSet<String>,
    /// Name of the rule's trigger, if one is set.
    pub trigger_name: Option<String>,
    /// Name of the `if`/scope node enclosing the position, if any.
    pub parent_type: Option<String>,
    /// Offer entries regardless of which behaviors are active.
    pub use_all_behaviors: bool,
}

impl FilterContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_active_behaviors<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.active_behaviors
            .extend(names.into_iter().map(str::to_owned));
        self
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger_name: &str) -> Self {
        self.trigger_name = Some(trigger_name.to_owned());
        self
    }

    #[must_use]
    pub fn with_parent_type(mut self, parent_type: &str) -> Self {
        self.parent_type = Some(parent_type.to_owned());
        self
    }

    #[must_use]
    pub fn with_all_behaviors(mut self, use_all: bool) -> Self {
        self.use_all_behaviors = use_all;
        self
    }

    /// Context for inserting at `path` in `rule`: trigger taken from the
    /// rule, parent type from the innermost enclosing `if`/scope node.
    #[must_use]
    pub fn for_position<'a>(
        rule: &Rule,
        path: &ResponsePath,
        active_behaviors: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            active_behaviors: active_behaviors.into_iter().map(str::to_owned).collect(),
            trigger_name: rule.trigger_name().map(str::to_owned),
            parent_type: rule.parent_type_at(path).map(str::to_owned),
            use_all_behaviors: false,
        }
    }
}

/// Whether a picker should offer `entry` in `ctx`.
///
/// All three checks must pass: the entry's behavior is active (or it needs
/// none, or all behaviors are allowed), the current trigger is in its
/// trigger filter, and the enclosing node type is in its parent filter.
/// Absent filters always pass; a present filter fails when the context has
/// no value to test.
#[must_use]
pub fn is_entry_visible(entry: &Entry, ctx: &FilterContext) -> bool {
    let behavior_ok = ctx.use_all_behaviors
        || entry
            .behavior_name
            .as_ref()
            .map_or(true, |b| ctx.active_behaviors.contains(b));

    let trigger_ok = entry.trigger_filter.as_ref().map_or(true, |allowed| {
        ctx.trigger_name
            .as_ref()
            .is_some_and(|t| allowed.contains(t))
    });

    let parent_ok = entry.parent_type_filter.as_ref().map_or(true, |allowed| {
        ctx.parent_type
            .as_ref()
            .is_some_and(|p| allowed.contains(p))
    });

    behavior_ok && trigger_ok && parent_ok
}

impl Entry {
    /// See [`is_entry_visible`].
    #[must_use]
    pub fn is_visible(&self, ctx: &FilterContext) -> bool {
        is_entry_visible(self, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Response, Trigger};

    fn ctx() -> FilterContext {
        FilterContext::new().with_active_behaviors(["Moving", "Body"])
    }

    #[test]
    fn unfiltered_entry_always_visible() {
        let entry = Entry::new("wait", "logic");
        assert!(is_entry_visible(&entry, &FilterContext::new()));
    }

    #[test]
    fn behavior_must_be_active() {
        let entry = Entry::new("move toward", "motion").with_behavior("Moving");
        assert!(is_entry_visible(&entry, &ctx()));

        let entry = Entry::new("play sound", "sound").with_behavior("Sounds");
        assert!(!is_entry_visible(&entry, &ctx()));
        assert!(is_entry_visible(&entry, &ctx().with_all_behaviors(true)));
    }

    #[test]
    fn trigger_filter() {
        let entry = Entry::new("stop", "motion").with_trigger_filter(["collide"]);
        assert!(!is_entry_visible(&entry, &ctx()));
        assert!(is_entry_visible(&entry, &ctx().with_trigger("collide")));
        assert!(!is_entry_visible(&entry, &ctx().with_trigger("tap")));
    }

    #[test]
    fn parent_type_filter() {
        let entry = Entry::new("stop repeating", "logic").with_parent_type_filter(["repeat"]);
        assert!(!is_entry_visible(&entry, &ctx()));
        assert!(is_entry_visible(&entry, &ctx().with_parent_type("repeat")));
        assert!(!is_entry_visible(&entry, &ctx().with_parent_type("if")));
    }

    #[test]
    fn all_checks_combine() {
        let entry = Entry::new("bounce", "motion")
            .with_behavior("Body")
            .with_trigger_filter(["collide"])
            .with_parent_type_filter(["if"]);
        let full = ctx().with_trigger("collide").with_parent_type("if");
        assert!(entry.is_visible(&full));
        assert!(!entry.is_visible(&FilterContext::new().with_trigger("collide").with_parent_type("if")));
    }

    #[test]
    fn for_position_reads_rule() {
        let rule = Rule::new()
            .with_trigger(Trigger::new("tap"))
            .with_response(Response::if_then(Response::action("wait").unwrap()));
        let ctx = FilterContext::for_position(&rule, &ResponsePath::root().then(), ["Body"]);
        assert_eq!(ctx.trigger_name.as_deref(), Some("tap"));
        assert_eq!(ctx.parent_type.as_deref(), Some("if"));
        assert!(ctx.active_behaviors.contains("Body"));
        assert!(!ctx.use_all_behaviors);

        let top = FilterContext::for_position(&rule, &ResponsePath::at(1), ["Body"]);
        assert!(top.parent_type.is_none());
    }
}
