use super::node::Response;
use super::rule::Rule;

/// What a preview row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewLine<'a> {
    Response {
        name: &'a str,
        condition: Option<&'a str>,
    },
    /// Divider introducing an `else` branch.
    Else,
}

/// One line of the read-only rule summary.
///
/// `order` is 0 for the first row of a nested list, which hosts draw with a
/// continuation arrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewRow<'a> {
    pub indent: usize,
    pub order: usize,
    pub line: PreviewLine<'a>,
}

impl PreviewRow<'_> {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self.line {
            PreviewLine::Response { name, .. } => Some(name),
            PreviewLine::Else => None,
        }
    }
}

impl Rule {
    /// Flatten the response tree into indented rows. Top-level responses
    /// sit at indent 1; nested lists are one deeper and restart at order 0.
    #[must_use]
    pub fn preview_rows(&self) -> Vec<PreviewRow<'_>> {
        let mut rows = Vec::new();
        if let Some(head) = self.response.as_deref() {
            push_rows(&mut rows, head, 0, 1);
        }
        rows
    }
}

fn push_rows<'a>(rows: &mut Vec<PreviewRow<'a>>, head: &'a Response, first_order: usize, indent: usize) {
    for (offset, node) in head.chain().enumerate() {
        let order = first_order + offset;
        rows.push(PreviewRow {
            indent,
            order,
            line: PreviewLine::Response {
                name: node.name(),
                condition: node.condition().map(|c| c.name.as_str()),
            },
        });
        if let Some(then) = node.then_branch() {
            push_rows(rows, then, 0, indent + 1);
        }
        if let Some(otherwise) = node.else_branch() {
            rows.push(PreviewRow {
                indent,
                order: order + 1,
                line: PreviewLine::Else,
            });
            push_rows(rows, otherwise, 0, indent + 1);
        }
        if let Some(body) = node.body() {
            push_rows(rows, body, 0, indent + 1);
        }
    }
}
