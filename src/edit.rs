//! Node-level rule editing.
//!
//! Every function takes the node currently at some position of a response
//! list and returns whatever should occupy that position afterwards. Inputs
//! are never modified; untouched subtrees are shared with the result.
//!
//! The typed node model carries each mandated branch by construction, so the
//! malformed cases (an `if` without `then`) are rejected where trees enter the
//! crate (JSON decoding, [`Response::action`]) rather than here.

use std::sync::Arc;

use crate::types::{Condition, Response, ResponseKind, Scope, RULES_BEHAVIOR_ID};

/// Splice `new_node` in front of `target`. `target` keeps its own successors.
#[must_use]
pub fn insert_before(target: &Arc<Response>, new_node: Response) -> Arc<Response> {
    Arc::new(new_node.with_next(Some(Arc::clone(target))))
}

/// Delete `target`, returning what takes its place in the enclosing list.
///
/// A plain node is skipped. An `if` or scope node is flattened: its nested
/// lists (`then` then `else`, or `body`) are promoted into its position and
/// whatever followed `target` is attached after the last promoted node.
#[must_use]
pub fn remove(target: &Response) -> Option<Arc<Response>> {
    let next = target.next().cloned();
    if !target.is_structural() {
        return next;
    }
    tracing::trace!(node = target.name(), "flattening nested responses");
    flatten(target.branches(), next)
}

fn flatten(branches: Vec<&Arc<Response>>, next: Option<Arc<Response>>) -> Option<Arc<Response>> {
    branches
        .into_iter()
        .rev()
        .filter(|branch| !is_placeholder(branch))
        .fold(next, |rest, branch| Some(append_chain(branch, rest)))
}

/// A lone `"none"` node standing in for an empty branch.
pub(crate) fn is_placeholder(head: &Response) -> bool {
    head.is_empty() && head.next().is_none()
}

/// Attach `tail` after the last node of the list starting at `head`.
///
/// Every node of `head`'s list is copied since each of their successor links
/// changes transitively; `tail` itself is shared.
#[must_use]
pub fn append_chain(head: &Arc<Response>, tail: Option<Arc<Response>>) -> Arc<Response> {
    if tail.is_none() {
        return Arc::clone(head);
    }
    let rest: Vec<&Response> = head.chain().skip(1).collect();
    let rest = rest
        .into_iter()
        .rev()
        .fold(tail, |after, node| Some(Arc::new(node.clone().with_next(after))));
    Arc::new((**head).clone().with_next(rest))
}

/// Whether [`move_down`] would change anything.
#[must_use]
pub fn can_move_down(target: &Response) -> bool {
    target.next().is_some()
}

/// Swap `target` with its immediate successor. The last node of a list is
/// returned unchanged.
#[must_use]
pub fn move_down(target: &Arc<Response>) -> Arc<Response> {
    let Some(child) = target.next() else {
        return Arc::clone(target);
    };
    let moved = (**target).clone().with_next(child.next().cloned());
    Arc::new((**child).clone().with_next(Some(Arc::new(moved))))
}

/// Wrap `target` in a new `if` with no condition yet.
///
/// `target` moves into `then` together with all of its successors, so the
/// nodes after it end up inside the conditional rather than after it.
#[must_use]
pub fn wrap_in_condition(target: &Arc<Response>) -> Arc<Response> {
    Arc::new(Response::if_then(Arc::clone(target)).with_behavior_id(RULES_BEHAVIOR_ID))
}

/// Wrap `target` (and its successors) in an `act on` block.
#[must_use]
pub fn wrap_in_act_on(target: &Arc<Response>) -> Arc<Response> {
    wrap_in_scope(Scope::ActOn, target, None)
}

/// Wrap `target` (and its successors) in a `repeat` that runs once.
#[must_use]
pub fn wrap_in_repeat(target: &Arc<Response>) -> Arc<Response> {
    wrap_in_scope(Scope::Repeat, target, Some(("count", 1)))
}

/// Wrap `target` (and its successors) in an unbounded `repeat`, one
/// iteration per `interval` seconds.
#[must_use]
pub fn wrap_in_infinite_repeat(target: &Arc<Response>) -> Arc<Response> {
    wrap_in_scope(Scope::Repeat, target, Some(("interval", 1)))
}

fn wrap_in_scope(
    scope: Scope,
    target: &Arc<Response>,
    default: Option<(&str, i64)>,
) -> Arc<Response> {
    let mut node = Response::scoped(scope, Arc::clone(target)).with_behavior_id(RULES_BEHAVIOR_ID);
    if let Some((key, value)) = default {
        node = node.with_param(key, value);
    }
    Arc::new(node)
}

/// Put `new_node` where `target` was.
///
/// Nothing is carried over from `target`: its successors are dropped unless
/// the caller linked them into `new_node` already.
#[must_use]
pub fn replace(target: &Arc<Response>, new_node: Response) -> Arc<Response> {
    if target.next().is_some() && new_node.next().is_none() {
        tracing::trace!(node = target.name(), "replace drops trailing responses");
    }
    Arc::new(new_node)
}

/// Set (or change) the condition of an `if`. `None` for any other node.
#[must_use]
pub fn set_condition(target: &Response, condition: Condition) -> Option<Arc<Response>> {
    match target.kind() {
        ResponseKind::If { .. } => Some(Arc::new(target.clone().with_condition(condition))),
        _ => None,
    }
}

/// A mutation request for one position of a rule.
///
/// Applied with [`Rule::apply`](crate::Rule::apply).
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    InsertBefore(Response),
    Remove,
    MoveDown,
    WrapInCondition,
    WrapInActOn,
    WrapInRepeat,
    WrapInInfiniteRepeat,
    Replace(Response),
    SetCondition(Condition),
}

impl Edit {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Edit::InsertBefore(_) => "insert before",
            Edit::Remove => "remove",
            Edit::MoveDown => "move down",
            Edit::WrapInCondition => "wrap in condition",
            Edit::WrapInActOn => "wrap in act on",
            Edit::WrapInRepeat => "wrap in repeat",
            Edit::WrapInInfiniteRepeat => "wrap in infinite repeat",
            Edit::Replace(_) => "replace",
            Edit::SetCondition(_) => "set condition",
        }
    }

    /// Whether the edit can target an empty position (the end of a list, or
    /// a rule with no responses yet).
    #[must_use]
    pub fn accepts_empty_slot(&self) -> bool {
        matches!(self, Edit::InsertBefore(_) | Edit::Replace(_))
    }
}
