use std::fmt;

use crate::types::{write_key, Condition, Params, Response, ResponseKind, Trigger};
use crate::Rule;

const INDENT: &str = "    ";

fn write_head(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    behavior_id: Option<i64>,
    params: &Params,
) -> fmt::Result {
    write_key(f, name)?;
    if let Some(id) = behavior_id {
        write!(f, "@{id}")?;
    }
    if !params.is_empty() {
        write!(f, "{params}")?;
    }
    Ok(())
}

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    Ok(())
}

/// One line per node, nested lists in braces one level deeper.
fn write_list(f: &mut fmt::Formatter<'_>, head: &Response, depth: usize) -> fmt::Result {
    for node in head.chain() {
        write_indent(f, depth)?;
        match node.kind() {
            ResponseKind::Empty => {
                f.write_str("none")?;
                if let Some(id) = node.behavior_id() {
                    write!(f, "@{id}")?;
                }
                if !node.params().is_empty() {
                    write!(f, "{}", node.params())?;
                }
            }
            ResponseKind::Action { name } => {
                write_head(f, name, node.behavior_id(), node.params())?;
            }
            ResponseKind::If {
                condition,
                then,
                otherwise,
            } => {
                f.write_str("if")?;
                if let Some(id) = node.behavior_id() {
                    write!(f, "@{id}")?;
                }
                if !node.params().is_empty() {
                    write!(f, "{}", node.params())?;
                }
                if let Some(condition) = condition {
                    write!(f, " ({condition})")?;
                }
                write_block(f, then, depth)?;
                if let Some(otherwise) = otherwise {
                    f.write_str(" else")?;
                    write_block(f, otherwise, depth)?;
                }
            }
            ResponseKind::Scoped { scope, body } => {
                write_head(f, scope.name(), node.behavior_id(), node.params())?;
                write_block(f, body, depth)?;
            }
        }
        f.write_str("\n")?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, head: &Response, depth: usize) -> fmt::Result {
    f.write_str(" {\n")?;
    write_list(f, head, depth + 1)?;
    write_indent(f, depth)?;
    f.write_str("}")
}

/// Prints rule notation, e.g.
///
/// ```text
/// when collide {
///     if ("random chance"(probability: 0.5)) {
///         "play sound"
///     }
/// }
/// ```
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("when")?;
        if let Some(trigger) = &self.trigger {
            write!(f, " {trigger}")?;
        }
        f.write_str(" {\n")?;
        if let Some(head) = &self.response {
            write_list(f, head, 1)?;
        }
        f.write_str("}")
    }
}

/// Prints the list starting at this node, one node per line.
impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self, 0)
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, &self.name, self.behavior_id, &self.params)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_head(f, &self.name, self.behavior_id, &self.params)
    }
}
