//! Host interchange form of rules.
//!
//! Every node is an object `{ "name", "behaviorId"?, "params": {..} }`. The
//! structural links live inside `params` under `nextResponse`, `then`,
//! `else`, `body` and `condition`; every other key is a plain parameter.
//! A structural key only has that meaning on nodes whose name calls for it,
//! so `then` on a `wait` node is an ordinary parameter.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

use crate::types::{
    Condition, EditError, Entry, Params, Response, ResponseKind, Rule, Scope, Trigger, Value,
    IF_NAME,
};

const NAME_KEY: &str = "name";
const BEHAVIOR_ID_KEY: &str = "behaviorId";
const PARAMS_KEY: &str = "params";
const NEXT_KEY: &str = "nextResponse";
const THEN_KEY: &str = "then";
const ELSE_KEY: &str = "else";
const BODY_KEY: &str = "body";
const CONDITION_KEY: &str = "condition";
const EXPRESSION_TYPE_KEY: &str = "expressionType";

/// Errors produced when decoding host JSON.
///
/// `at` is a dotted location such as `response.nextResponse.then`.
#[derive(Debug, Error)]
pub enum JsonError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("{at}: expected a node object")]
    NotAnObject { at: String },

    #[error("{at}: node has no 'name' string")]
    MissingName { at: String },

    #[error("{at}: '{field}' must be {expected}")]
    InvalidField {
        at: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{at}: number {number} cannot be represented")]
    UnsupportedNumber { at: String, number: String },

    #[error("{at}: {source}")]
    Malformed {
        at: String,
        #[source]
        source: EditError,
    },
}

impl JsonError {
    /// The underlying tree error, if the input was structurally malformed.
    #[must_use]
    pub fn as_edit_error(&self) -> Option<&EditError> {
        match self {
            JsonError::Malformed { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn malformed(at: &str, source: EditError) -> JsonError {
    JsonError::Malformed {
        at: at.to_owned(),
        source,
    }
}

// -- Values -----------------------------------------------------------------

fn encode_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        // JSON has no NaN or infinity.
        Value::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::List(items) => JsonValue::Array(items.iter().map(encode_value).collect()),
        Value::Map(params) => JsonValue::Object(encode_params(params)),
        Value::Expression {
            expression_type,
            params,
        } => {
            let mut map = Map::new();
            map.insert(
                EXPRESSION_TYPE_KEY.to_owned(),
                JsonValue::String(expression_type.clone()),
            );
            map.insert(PARAMS_KEY.to_owned(), JsonValue::Object(encode_params(params)));
            JsonValue::Object(map)
        }
    }
}

fn encode_params(params: &Params) -> Map<String, JsonValue> {
    params
        .iter()
        .map(|(key, value)| (key.to_owned(), encode_value(value)))
        .collect()
}

fn decode_number(n: &Number, at: &str) -> Result<Value, JsonError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            return Ok(Value::Float(f));
        }
    }
    Err(JsonError::UnsupportedNumber {
        at: at.to_owned(),
        number: n.to_string(),
    })
}

/// An object holding only `expressionType` (a string) and an optional
/// `params` object.
fn as_expression(map: &Map<String, JsonValue>) -> Option<(&str, Option<&Map<String, JsonValue>>)> {
    let expression_type = map.get(EXPRESSION_TYPE_KEY)?.as_str()?;
    let params = match map.get(PARAMS_KEY) {
        None => None,
        Some(JsonValue::Object(params)) => Some(params),
        Some(_) => return None,
    };
    let extra = map
        .keys()
        .any(|key| key != EXPRESSION_TYPE_KEY && key != PARAMS_KEY);
    (!extra).then_some((expression_type, params))
}

fn decode_value(json: &JsonValue, at: &str) -> Result<Value, JsonError> {
    Ok(match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => decode_number(n, at)?,
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(items) => Value::List(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_value(item, &format!("{at}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        JsonValue::Object(map) => match as_expression(map) {
            Some((expression_type, params)) => Value::Expression {
                expression_type: expression_type.to_owned(),
                params: match params {
                    Some(params) => decode_params(params, at)?,
                    None => Params::new(),
                },
            },
            None => Value::Map(decode_params(map, at)?),
        },
    })
}

fn decode_params(map: &Map<String, JsonValue>, at: &str) -> Result<Params, JsonError> {
    let mut params = Params::new();
    for (key, value) in map {
        params.insert(key, decode_value(value, &format!("{at}.{key}"))?);
    }
    Ok(params)
}

// -- Nodes ------------------------------------------------------------------

struct RawNode<'a> {
    name: &'a str,
    behavior_id: Option<i64>,
    params: Option<&'a Map<String, JsonValue>>,
}

impl<'a> RawNode<'a> {
    fn read(json: &'a JsonValue, at: &str) -> Result<Self, JsonError> {
        let map = json.as_object().ok_or_else(|| JsonError::NotAnObject {
            at: at.to_owned(),
        })?;
        let name = map
            .get(NAME_KEY)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| JsonError::MissingName { at: at.to_owned() })?;
        let behavior_id = match map.get(BEHAVIOR_ID_KEY) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Number(n)) => {
                Some(n.as_i64().ok_or_else(|| JsonError::UnsupportedNumber {
                    at: format!("{at}.{BEHAVIOR_ID_KEY}"),
                    number: n.to_string(),
                })?)
            }
            Some(_) => {
                return Err(JsonError::InvalidField {
                    at: at.to_owned(),
                    field: BEHAVIOR_ID_KEY,
                    expected: "an integer",
                })
            }
        };
        let params = match map.get(PARAMS_KEY) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::Object(params)) => Some(params),
            Some(_) => {
                return Err(JsonError::InvalidField {
                    at: at.to_owned(),
                    field: PARAMS_KEY,
                    expected: "an object",
                })
            }
        };
        Ok(Self {
            name,
            behavior_id,
            params,
        })
    }

    fn entries(&self) -> impl Iterator<Item = (&'a String, &'a JsonValue)> {
        self.params.into_iter().flatten()
    }
}

fn node_object(name: &str, behavior_id: Option<i64>, params: Map<String, JsonValue>) -> JsonValue {
    let mut map = Map::new();
    map.insert(NAME_KEY.to_owned(), JsonValue::String(name.to_owned()));
    if let Some(id) = behavior_id {
        map.insert(BEHAVIOR_ID_KEY.to_owned(), JsonValue::from(id));
    }
    map.insert(PARAMS_KEY.to_owned(), JsonValue::Object(params));
    JsonValue::Object(map)
}

/// Name, behavior id and params of a trigger or condition. These are never
/// threaded, so a `nextResponse` on one is dropped.
fn decode_leaf(
    json: &JsonValue,
    at: &str,
    role: &str,
) -> Result<(String, Option<i64>, Params), JsonError> {
    let raw = RawNode::read(json, at)?;
    let mut params = Params::new();
    for (key, value) in raw.entries() {
        if key == NEXT_KEY {
            if !value.is_null() {
                tracing::warn!(node = raw.name, at, "ignoring successor link on {role} node");
            }
            continue;
        }
        params.insert(key, decode_value(value, &format!("{at}.{key}"))?);
    }
    Ok((raw.name.to_owned(), raw.behavior_id, params))
}

fn decode_condition(json: &JsonValue, at: &str) -> Result<Condition, JsonError> {
    let (name, behavior_id, params) = decode_leaf(json, at, "condition")?;
    Ok(Condition {
        name,
        behavior_id,
        params,
    })
}

fn decode_trigger(json: &JsonValue, at: &str) -> Result<Trigger, JsonError> {
    let (name, behavior_id, params) = decode_leaf(json, at, "trigger")?;
    Ok(Trigger {
        name,
        behavior_id,
        params,
    })
}

/// A nested list head (`then`, `else`, `body`) of the node at `at`.
fn decode_branch(
    json: &JsonValue,
    at: &str,
    node: &str,
    key: &str,
) -> Result<Arc<Response>, JsonError> {
    if !json.is_object() {
        return Err(malformed(at, EditError::child_not_a_node(node, key)));
    }
    decode_chain(json, &format!("{at}.{key}"))
}

/// One response node plus the raw JSON of its successor, if any.
fn decode_response<'a>(
    json: &'a JsonValue,
    at: &str,
) -> Result<(Response, Option<&'a JsonValue>), JsonError> {
    let raw = RawNode::read(json, at)?;
    let is_if = raw.name == IF_NAME;
    let scope = Scope::from_name(raw.name);

    let mut params = Params::new();
    let mut next = None;
    let mut then = None;
    let mut otherwise = None;
    let mut condition = None;
    let mut body = None;
    for (key, value) in raw.entries() {
        let slot = match key.as_str() {
            NEXT_KEY => &mut next,
            THEN_KEY if is_if => &mut then,
            ELSE_KEY if is_if => &mut otherwise,
            CONDITION_KEY if is_if => &mut condition,
            BODY_KEY if scope.is_some() => &mut body,
            _ => {
                params.insert(key, decode_value(value, &format!("{at}.{key}"))?);
                continue;
            }
        };
        if !value.is_null() {
            *slot = Some(value);
        }
    }

    let node = if is_if {
        let then = then.ok_or_else(|| malformed(at, EditError::missing_child(IF_NAME, THEN_KEY)))?;
        let mut node = Response::if_then(decode_branch(then, at, IF_NAME, THEN_KEY)?).with_else(
            otherwise
                .map(|o| decode_branch(o, at, IF_NAME, ELSE_KEY))
                .transpose()?,
        );
        if let Some(condition) = condition {
            if !condition.is_object() {
                return Err(malformed(
                    at,
                    EditError::child_not_a_node(IF_NAME, CONDITION_KEY),
                ));
            }
            node = node.with_condition(decode_condition(
                condition,
                &format!("{at}.{CONDITION_KEY}"),
            )?);
        }
        node
    } else if let Some(scope) = scope {
        let body = body.ok_or_else(|| malformed(at, EditError::missing_child(scope.name(), BODY_KEY)))?;
        Response::scoped(scope, decode_branch(body, at, scope.name(), BODY_KEY)?)
    } else {
        Response::action(raw.name).map_err(|e| malformed(at, e))?
    };

    let mut node = node.with_params(params);
    if let Some(id) = raw.behavior_id {
        node = node.with_behavior_id(id);
    }
    if let Some(next) = next {
        if !next.is_object() {
            return Err(JsonError::NotAnObject {
                at: format!("{at}.{NEXT_KEY}"),
            });
        }
    }
    Ok((node, next))
}

/// Decode a list iteratively so long lists do not grow the stack.
fn decode_chain(json: &JsonValue, at: &str) -> Result<Arc<Response>, JsonError> {
    let (head, mut next) = decode_response(json, at)?;
    let mut at = at.to_owned();
    let mut rest = Vec::new();
    while let Some(json) = next {
        at.push('.');
        at.push_str(NEXT_KEY);
        let (node, following) = decode_response(json, &at)?;
        rest.push(node);
        next = following;
    }
    Ok(Arc::new(head.with_next(Response::link(rest))))
}

fn encode_response(node: &Response, next: Option<JsonValue>) -> JsonValue {
    let mut params = encode_params(node.params());
    match node.kind() {
        ResponseKind::If {
            condition,
            then,
            otherwise,
        } => {
            if let Some(condition) = condition {
                params.insert(CONDITION_KEY.to_owned(), condition.to_json());
            }
            params.insert(THEN_KEY.to_owned(), then.to_json());
            if let Some(otherwise) = otherwise {
                params.insert(ELSE_KEY.to_owned(), otherwise.to_json());
            }
        }
        ResponseKind::Scoped { body, .. } => {
            params.insert(BODY_KEY.to_owned(), body.to_json());
        }
        ResponseKind::Empty | ResponseKind::Action { .. } => {}
    }
    if let Some(next) = next {
        params.insert(NEXT_KEY.to_owned(), next);
    }
    node_object(node.name(), node.behavior_id(), params)
}

// -- Public surface ---------------------------------------------------------

impl Response {
    /// Encode this node and its successors.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let nodes: Vec<&Response> = self.chain().collect();
        nodes
            .into_iter()
            .rev()
            .fold(None, |next, node| Some(encode_response(node, next)))
            .unwrap_or(JsonValue::Null)
    }

    /// Decode a response list from its head node.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError`] if the input is not a well-formed node, including
    /// [`JsonError::Malformed`] for an `if` without `then` or a scope without
    /// `body`.
    pub fn from_json(json: &JsonValue) -> Result<Arc<Response>, JsonError> {
        decode_chain(json, "response")
    }

    /// The node a picker inserts for `entry`: its name and behavior id, with
    /// the entry's initial parameters.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Malformed`] if the entry is an `if` or scope
    /// whose initial parameters do not supply the required branch.
    pub fn from_entry(entry: &Entry) -> Result<Response, JsonError> {
        let json = entry_node(entry);
        let (node, next) = decode_response(&json, &entry.name)?;
        if next.is_some() {
            tracing::warn!(entry = %entry.name, "ignoring successor link in initial params");
        }
        Ok(node)
    }
}

fn entry_node(entry: &Entry) -> JsonValue {
    node_object(
        &entry.name,
        entry.behavior_id,
        entry.initial_params.clone().unwrap_or_default(),
    )
}

macro_rules! leaf_node_json {
    ($ty:ident, $decode:ident, $role:literal) => {
        impl $ty {
            #[must_use]
            pub fn to_json(&self) -> JsonValue {
                node_object(&self.name, self.behavior_id, encode_params(&self.params))
            }

            /// # Errors
            ///
            /// Returns [`JsonError`] if the input is not a node object.
            pub fn from_json(json: &JsonValue) -> Result<Self, JsonError> {
                $decode(json, $role)
            }

            /// A node for `entry` with the entry's initial parameters.
            ///
            /// # Errors
            ///
            /// Returns [`JsonError`] if the initial parameters hold a number
            /// that cannot be represented.
            pub fn from_entry(entry: &Entry) -> Result<Self, JsonError> {
                $decode(&entry_node(entry), &entry.name)
            }
        }
    };
}

leaf_node_json!(Trigger, decode_trigger, "trigger");
leaf_node_json!(Condition, decode_condition, "condition");

impl Rule {
    /// `{"trigger": node | null, "response": node | null}`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert(
            "trigger".to_owned(),
            self.trigger.as_ref().map_or(JsonValue::Null, Trigger::to_json),
        );
        map.insert(
            "response".to_owned(),
            self.response
                .as_deref()
                .map_or(JsonValue::Null, Response::to_json),
        );
        JsonValue::Object(map)
    }

    /// # Errors
    ///
    /// Returns [`JsonError`] if the input is not a rule object or any node in
    /// it is malformed.
    pub fn from_json(json: &JsonValue) -> Result<Rule, JsonError> {
        let map = json.as_object().ok_or_else(|| JsonError::NotAnObject {
            at: "rule".to_owned(),
        })?;
        let trigger = match map.get("trigger") {
            None | Some(JsonValue::Null) => None,
            Some(trigger) => Some(decode_trigger(trigger, "trigger")?),
        };
        let response = match map.get("response") {
            None | Some(JsonValue::Null) => None,
            Some(response) => Some(decode_chain(response, "response")?),
        };
        Ok(Rule { trigger, response })
    }

    #[must_use]
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }

    /// # Errors
    ///
    /// Returns [`JsonError::Syntax`] for text that is not JSON, or any error
    /// from [`Rule::from_json`].
    pub fn from_json_str(json: &str) -> Result<Rule, JsonError> {
        // Each link nests two objects deep, so the default limit of 128
        // would cap a list at about sixty responses. With the limit off the
        // stack has to grow on demand instead.
        let mut de = serde_json::Deserializer::from_str(json);
        de.disable_recursion_limit();
        let value = JsonValue::deserialize(serde_stacker::Deserializer::new(&mut de))?;
        de.end()?;
        let rule = Self::from_json(&value);
        release(value);
        rule
    }
}

/// Drop a parsed document without recursing once per nesting level.
fn release(value: JsonValue) {
    let mut pending = vec![value];
    while let Some(mut value) = pending.pop() {
        match &mut value {
            JsonValue::Array(items) => pending.append(items),
            JsonValue::Object(map) => {
                pending.extend(std::mem::take(map).into_iter().map(|(_, v)| v));
            }
            _ => {}
        }
    }
}
