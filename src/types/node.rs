use std::sync::Arc;

use super::error::EditError;
use super::value::{Params, Value};

/// Behavior id stamped on nodes the editor creates itself (wrappers).
pub const RULES_BEHAVIOR_ID: i64 = 16;

/// Name of the canonical empty terminator node.
pub const EMPTY_NAME: &str = "none";

pub const IF_NAME: &str = "if";

/// Response kinds whose single nested list lives under `body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Repeat,
    ActOn,
    ActOnOther,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Repeat, Scope::ActOn, Scope::ActOnOther];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Scope::Repeat => "repeat",
            Scope::ActOn => "act on",
            Scope::ActOnOther => "act on other",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Scope> {
        Scope::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Returns `true` for names whose nodes must carry nested branches.
#[must_use]
pub fn is_structural_name(name: &str) -> bool {
    name == IF_NAME || Scope::from_name(name).is_some()
}

/// The event that starts a rule. Looked up in the trigger table by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub name: String,
    pub behavior_id: Option<i64>,
    pub params: Params,
}

/// The test of an `if` node. Looked up in the condition table by name.
///
/// Conditions are single nodes, never list heads, so there is no successor
/// link here.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub name: String,
    pub behavior_id: Option<i64>,
    pub params: Params,
}

macro_rules! leaf_node_builders {
    ($ty:ident) => {
        impl $ty {
            #[must_use]
            pub fn new(name: &str) -> Self {
                Self {
                    name: name.to_owned(),
                    behavior_id: None,
                    params: Params::new(),
                }
            }

            #[must_use]
            pub fn with_behavior_id(mut self, behavior_id: i64) -> Self {
                self.behavior_id = Some(behavior_id);
                self
            }

            #[must_use]
            pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
                self.params.insert(key, value);
                self
            }

            #[must_use]
            pub fn with_params(mut self, params: Params) -> Self {
                self.params = params;
                self
            }

            /// `true` for the `"none"` placeholder.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.name == EMPTY_NAME
            }
        }
    };
}

leaf_node_builders!(Trigger);
leaf_node_builders!(Condition);

/// Per-name shape of a response node. Only the branches a name mandates
/// exist, so an `if` always has `then` and never `body`.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseKind {
    /// The `"none"` terminator.
    Empty,
    /// Any response without nested lists.
    Action { name: String },
    If {
        condition: Option<Condition>,
        then: Arc<Response>,
        otherwise: Option<Arc<Response>>,
    },
    Scoped { scope: Scope, body: Arc<Response> },
}

/// One element of a response list.
///
/// Links are reference-counted and never mutated after construction, so an
/// edited tree shares every untouched subtree with the tree it came from.
/// Comparing and dropping walk lists iteratively, so list length is bounded
/// by memory rather than stack depth.
#[derive(Debug, Clone)]
pub struct Response {
    kind: ResponseKind,
    behavior_id: Option<i64>,
    params: Params,
    next: Option<Arc<Response>>,
}

impl Response {
    fn with_kind(kind: ResponseKind) -> Self {
        Self {
            kind,
            behavior_id: None,
            params: Params::new(),
            next: None,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::with_kind(ResponseKind::Empty)
    }

    /// A plain response such as `"wait"` or `"play sound"`.
    ///
    /// `"none"` yields the empty node.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::MalformedRuleTree`] for `if`, `repeat`, `act on`
    /// and `act on other`, which need their branches supplied up front.
    pub fn action(name: &str) -> Result<Self, EditError> {
        if name == EMPTY_NAME {
            return Ok(Self::empty());
        }
        if is_structural_name(name) {
            return Err(EditError::reserved_name(name));
        }
        Ok(Self::with_kind(ResponseKind::Action {
            name: name.to_owned(),
        }))
    }

    /// An `if` node with no condition picked yet.
    #[must_use]
    pub fn if_then(then: impl Into<Arc<Response>>) -> Self {
        Self::with_kind(ResponseKind::If {
            condition: None,
            then: then.into(),
            otherwise: None,
        })
    }

    #[must_use]
    pub fn scoped(scope: Scope, body: impl Into<Arc<Response>>) -> Self {
        Self::with_kind(ResponseKind::Scoped {
            scope,
            body: body.into(),
        })
    }

    /// Sets the condition of an `if`; ignored on every other kind.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        if let ResponseKind::If { condition: c, .. } = &mut self.kind {
            *c = Some(condition);
        }
        self
    }

    /// Sets the `else` branch of an `if`; ignored on every other kind.
    #[must_use]
    pub fn with_else(mut self, otherwise: Option<Arc<Response>>) -> Self {
        if let ResponseKind::If { otherwise: o, .. } = &mut self.kind {
            *o = otherwise;
        }
        self
    }

    #[must_use]
    pub fn with_behavior_id(mut self, behavior_id: i64) -> Self {
        self.behavior_id = Some(behavior_id);
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Replaces the successor link, keeping everything else.
    #[must_use]
    pub fn with_next(mut self, next: Option<Arc<Response>>) -> Self {
        self.next = next;
        self
    }

    #[must_use]
    pub fn with_kind_replaced(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Link `nodes` into a list, first element at the head.
    ///
    /// Existing `next` links of the inputs are overwritten.
    pub fn link(nodes: impl IntoIterator<Item = Response>) -> Option<Arc<Response>> {
        let nodes: Vec<Response> = nodes.into_iter().collect();
        nodes
            .into_iter()
            .rev()
            .fold(None, |next, node| Some(Arc::new(node.with_next(next))))
    }

    #[must_use]
    pub fn kind(&self) -> &ResponseKind {
        &self.kind
    }

    /// The catalog name this node refers to.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.kind {
            ResponseKind::Empty => EMPTY_NAME,
            ResponseKind::Action { name } => name,
            ResponseKind::If { .. } => IF_NAME,
            ResponseKind::Scoped { scope, .. } => scope.name(),
        }
    }

    #[must_use]
    pub fn behavior_id(&self) -> Option<i64> {
        self.behavior_id
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub fn next(&self) -> Option<&Arc<Response>> {
        self.next.as_ref()
    }

    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        match &self.kind {
            ResponseKind::If { condition, .. } => condition.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn then_branch(&self) -> Option<&Arc<Response>> {
        match &self.kind {
            ResponseKind::If { then, .. } => Some(then),
            _ => None,
        }
    }

    #[must_use]
    pub fn else_branch(&self) -> Option<&Arc<Response>> {
        match &self.kind {
            ResponseKind::If { otherwise, .. } => otherwise.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn body(&self) -> Option<&Arc<Response>> {
        match &self.kind {
            ResponseKind::Scoped { body, .. } => Some(body),
            _ => None,
        }
    }

    /// `true` for the `"none"` terminator with no parameters of its own.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, ResponseKind::Empty) && self.params.is_empty()
    }

    /// `true` when this node owns nested lists.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self.kind,
            ResponseKind::If { .. } | ResponseKind::Scoped { .. }
        )
    }

    /// Nested list heads in splice order: `then`, `else` for an `if`;
    /// `body` for a scope.
    #[must_use]
    pub fn branches(&self) -> Vec<&Arc<Response>> {
        match &self.kind {
            ResponseKind::If {
                then, otherwise, ..
            } => std::iter::once(then).chain(otherwise).collect(),
            ResponseKind::Scoped { body, .. } => vec![body],
            ResponseKind::Empty | ResponseKind::Action { .. } => Vec::new(),
        }
    }

    /// Iterate this node and its successors.
    #[must_use]
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            current: Some(self),
        }
    }

    /// Names along the `next` chain starting at this node.
    #[must_use]
    pub fn chain_names(&self) -> Vec<&str> {
        self.chain().map(Response::name).collect()
    }

    /// The last node of the list starting here.
    #[must_use]
    pub fn tail(&self) -> &Response {
        let mut tail = self;
        while let Some(next) = tail.next.as_deref() {
            tail = next;
        }
        tail
    }

    /// Pre-order traversal: a node, its nested branches, then its successor.
    /// The callback receives the nesting depth (0 for the list this node is
    /// in).
    pub fn visit(&self, mut f: impl FnMut(&Response, usize)) {
        let mut stack: Vec<(&Response, usize)> = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            f(node, depth);
            if let Some(next) = node.next.as_deref() {
                stack.push((next, depth));
            }
            for branch in node.branches().into_iter().rev() {
                stack.push((branch, depth + 1));
            }
        }
    }

    /// Number of response nodes reachable from here (conditions excluded).
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit(|_, _| count += 1);
        count
    }
}

impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        let mut ours = self.chain();
        let mut theirs = other.chain();
        loop {
            match (ours.next(), theirs.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if std::ptr::eq(a, b) => return true,
                (Some(a), Some(b))
                    if a.behavior_id == b.behavior_id
                        && a.params == b.params
                        && a.kind == b.kind => {}
                _ => return false,
            }
        }
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_links(self, &mut pending);
        while let Some(link) = pending.pop() {
            // Nodes still shared with another tree are left to that tree.
            if let Ok(mut node) = Arc::try_unwrap(link) {
                detach_links(&mut node, &mut pending);
            }
        }
    }
}

fn detach_links(node: &mut Response, pending: &mut Vec<Arc<Response>>) {
    pending.extend(node.next.take());
    if !node.is_structural() {
        return;
    }
    match std::mem::replace(&mut node.kind, ResponseKind::Empty) {
        ResponseKind::If {
            then, otherwise, ..
        } => {
            pending.push(then);
            pending.extend(otherwise);
        }
        ResponseKind::Scoped { body, .. } => pending.push(body),
        ResponseKind::Empty | ResponseKind::Action { .. } => {}
    }
}

/// Iterator over a response list. See [`Response::chain`].
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    current: Option<&'a Response>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Response;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        self.current = node.next.as_deref();
        Some(node)
    }
}
