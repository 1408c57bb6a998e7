use std::sync::Arc;

use crate::edit::{self, Edit};
use crate::types::{EditError, Response, ResponseKind, ResponsePath, Rule, Step};

type Slot<'a> = Option<&'a Arc<Response>>;

impl Rule {
    /// The response at `path`, or `None` if the position is empty or does
    /// not exist.
    #[must_use]
    pub fn get(&self, path: &ResponsePath) -> Option<&Arc<Response>> {
        let mut slot = self.response.as_ref();
        for step in path.steps() {
            let node = slot?;
            slot = match step {
                Step::Next => node.next(),
                Step::Then => node.then_branch(),
                Step::Else => node.else_branch(),
                Step::Body => node.body(),
            };
        }
        slot
    }

    /// Apply `edit` to the position `path` and return the edited rule.
    ///
    /// Only the nodes between the rule and the target are copied. A `then`
    /// or `body` list emptied by the edit is refilled with the `"none"`
    /// node; an emptied `else` is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::InvalidPath`] if the path walks through a branch
    /// its node does not have, past the end of a list, or targets an empty
    /// position with an edit that needs a node.
    pub fn apply(&self, path: &ResponsePath, edit: Edit) -> Result<Rule, EditError> {
        tracing::debug!(edit = edit.name(), path = %path, "applying rule edit");
        let mut edit = Some(edit);
        let response = rewrite(self.response.as_ref(), path.steps(), path, &mut |slot: Slot<'_>| {
            match edit.take() {
                Some(edit) => apply_at(slot, edit, path),
                None => Ok(slot.cloned()),
            }
        })?;
        Ok(Rule {
            trigger: self.trigger.clone(),
            response,
        })
    }

    /// Apply several edits in order, each against the result of the previous.
    ///
    /// # Errors
    ///
    /// Stops at the first failing edit.
    pub fn apply_all(
        &self,
        edits: impl IntoIterator<Item = (ResponsePath, Edit)>,
    ) -> Result<Rule, EditError> {
        edits
            .into_iter()
            .try_fold(self.clone(), |rule, (path, edit)| rule.apply(&path, edit))
    }

    /// Name of the innermost `if`/scope node enclosing `path`, if any.
    ///
    /// This is the parent type the picker filters on when offering entries
    /// for that position.
    #[must_use]
    pub fn parent_type_at(&self, path: &ResponsePath) -> Option<&str> {
        let steps = path.steps();
        let last_nested = steps.iter().rposition(|s| s.is_nested())?;
        let parent = ResponsePath::from_steps(steps[..last_nested].to_vec());
        self.get(&parent).map(|node| node.name())
    }
}

fn invalid(path: &ResponsePath, reason: impl Into<String>) -> EditError {
    EditError::InvalidPath {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Rebuild the spine from `slot` down to the target, letting `at_target`
/// compute the new occupant of the final position.
///
/// Runs of `next` steps are walked in a loop; only nested steps recurse.
fn rewrite(
    slot: Slot<'_>,
    steps: &[Step],
    path: &ResponsePath,
    at_target: &mut dyn FnMut(Slot<'_>) -> Result<Option<Arc<Response>>, EditError>,
) -> Result<Option<Arc<Response>>, EditError> {
    let run = steps.iter().take_while(|s| **s == Step::Next).count();
    let mut spine = Vec::with_capacity(run);
    let mut slot = slot;
    for _ in 0..run {
        let node = slot.ok_or_else(|| past_end(path))?;
        spine.push(node);
        slot = node.next();
    }
    let replaced = rewrite_nested(slot, &steps[run..], path, at_target)?;
    Ok(spine
        .into_iter()
        .rev()
        .fold(replaced, |next, node| Some(Arc::new((**node).clone().with_next(next)))))
}

fn past_end(path: &ResponsePath) -> EditError {
    invalid(path, "position is past the end of its list")
}

/// `steps` is empty or starts with a nested step.
fn rewrite_nested(
    slot: Slot<'_>,
    steps: &[Step],
    path: &ResponsePath,
    at_target: &mut dyn FnMut(Slot<'_>) -> Result<Option<Arc<Response>>, EditError>,
) -> Result<Option<Arc<Response>>, EditError> {
    let Some((step, rest)) = steps.split_first() else {
        return at_target(slot);
    };
    let node = slot.ok_or_else(|| past_end(path))?;

    let kind = match (step, node.kind()) {
        (Step::Next, _) => return rewrite(slot, steps, path, at_target),
        (
            Step::Then,
            ResponseKind::If {
                condition,
                then,
                otherwise,
            },
        ) => ResponseKind::If {
            condition: condition.clone(),
            then: or_empty(rewrite(Some(then), rest, path, at_target)?),
            otherwise: otherwise.clone(),
        },
        (
            Step::Else,
            ResponseKind::If {
                condition,
                then,
                otherwise,
            },
        ) => ResponseKind::If {
            condition: condition.clone(),
            then: Arc::clone(then),
            otherwise: rewrite(otherwise.as_ref(), rest, path, at_target)?,
        },
        (Step::Body, ResponseKind::Scoped { scope, body }) => ResponseKind::Scoped {
            scope: *scope,
            body: or_empty(rewrite(Some(body), rest, path, at_target)?),
        },
        (step, _) => {
            return Err(invalid(
                path,
                format!("'{}' node has no '{}' branch", node.name(), step.key()),
            ));
        }
    };
    Ok(Some(Arc::new((**node).clone().with_kind_replaced(kind))))
}

fn or_empty(head: Option<Arc<Response>>) -> Arc<Response> {
    head.unwrap_or_else(|| Arc::new(Response::empty()))
}

fn apply_at(
    slot: Slot<'_>,
    edit: Edit,
    path: &ResponsePath,
) -> Result<Option<Arc<Response>>, EditError> {
    // A placeholder branch counts as empty, so the first insert fills it.
    let slot = slot.filter(|node| !(edit.accepts_empty_slot() && edit::is_placeholder(node)));
    let target = match (slot, edit.accepts_empty_slot()) {
        (Some(target), _) => target,
        (None, true) => {
            // Appending to the end of a list or filling an empty rule.
            return Ok(match edit {
                Edit::InsertBefore(node) => Some(Arc::new(node.with_next(None))),
                Edit::Replace(node) => Some(Arc::new(node)),
                _ => None,
            });
        }
        (None, false) => {
            return Err(invalid(
                path,
                format!("no response to {} at this position", edit.name()),
            ));
        }
    };

    let replacement = match edit {
        Edit::InsertBefore(node) => Some(edit::insert_before(target, node)),
        Edit::Remove => edit::remove(target),
        Edit::MoveDown => Some(edit::move_down(target)),
        Edit::WrapInCondition => Some(edit::wrap_in_condition(target)),
        Edit::WrapInActOn => Some(edit::wrap_in_act_on(target)),
        Edit::WrapInRepeat => Some(edit::wrap_in_repeat(target)),
        Edit::WrapInInfiniteRepeat => Some(edit::wrap_in_infinite_repeat(target)),
        Edit::Replace(node) => Some(edit::replace(target, node)),
        Edit::SetCondition(condition) => {
            let updated = edit::set_condition(target, condition).ok_or_else(|| {
                invalid(path, format!("'{}' node has no condition", target.name()))
            })?;
            Some(updated)
        }
    };
    Ok(replacement)
}
