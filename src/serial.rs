//! Binary snapshots of rules.
//!
//! A snapshot is a 32-byte fixed header followed by a bincode-encoded
//! payload. Hosts use it to cache rules between sessions without going
//! through the JSON interchange form.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"RGRL"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! Every response list is stored as a vector rather than a linked chain, so
//! decoding never recurses along `next` links.
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Condition, Params, Response, ResponseKind, Rule, Scope, Trigger, Value};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"RGRL";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`Rule`] to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`Rule`] from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a rule snapshot: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    metadata: RuleMetadata,
    trigger: Option<SerializedLeaf>,
    response: Vec<SerializedResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleMetadata {
    node_count: usize,
    source_digest: Option<[u8; 32]>,
}

/// A trigger or condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedLeaf {
    name: String,
    behavior_id: Option<i64>,
    params: Vec<(String, SerializedValue)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedResponse {
    kind: SerializedKind,
    behavior_id: Option<i64>,
    params: Vec<(String, SerializedValue)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedKind {
    Empty,
    Action(String),
    If {
        condition: Option<SerializedLeaf>,
        then: Vec<SerializedResponse>,
        otherwise: Option<Vec<SerializedResponse>>,
    },
    Scoped {
        scope: SerializedScope,
        body: Vec<SerializedResponse>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum SerializedScope {
    Repeat,
    ActOn,
    ActOnOther,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<SerializedValue>),
    Map(Vec<(String, SerializedValue)>),
    Expression {
        expression_type: String,
        params: Vec<(String, SerializedValue)>,
    },
}

// ---------------------------------------------------------------------------
// Scope conversion
// ---------------------------------------------------------------------------

fn serialize_scope(scope: Scope) -> SerializedScope {
    match scope {
        Scope::Repeat => SerializedScope::Repeat,
        Scope::ActOn => SerializedScope::ActOn,
        Scope::ActOnOther => SerializedScope::ActOnOther,
    }
}

fn deserialize_scope(scope: SerializedScope) -> Scope {
    match scope {
        SerializedScope::Repeat => Scope::Repeat,
        SerializedScope::ActOn => Scope::ActOn,
        SerializedScope::ActOnOther => Scope::ActOnOther,
    }
}

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

fn serialize_value(value: &Value) -> SerializedValue {
    match value {
        Value::Null => SerializedValue::Null,
        Value::Bool(v) => SerializedValue::Bool(*v),
        Value::Int(v) => SerializedValue::Int(*v),
        Value::Float(v) => SerializedValue::Float(*v),
        Value::String(v) => SerializedValue::Str(v.clone()),
        Value::List(items) => SerializedValue::List(items.iter().map(serialize_value).collect()),
        Value::Map(params) => SerializedValue::Map(serialize_params(params)),
        Value::Expression {
            expression_type,
            params,
        } => SerializedValue::Expression {
            expression_type: expression_type.clone(),
            params: serialize_params(params),
        },
    }
}

fn serialize_params(params: &Params) -> Vec<(String, SerializedValue)> {
    params
        .iter()
        .map(|(key, value)| (key.to_owned(), serialize_value(value)))
        .collect()
}

fn deserialize_value(value: SerializedValue) -> Value {
    match value {
        SerializedValue::Null => Value::Null,
        SerializedValue::Bool(v) => Value::Bool(v),
        SerializedValue::Int(v) => Value::Int(v),
        SerializedValue::Float(v) => Value::Float(v),
        SerializedValue::Str(v) => Value::String(v),
        SerializedValue::List(items) => {
            Value::List(items.into_iter().map(deserialize_value).collect())
        }
        SerializedValue::Map(pairs) => Value::Map(deserialize_params(pairs)),
        SerializedValue::Expression {
            expression_type,
            params,
        } => Value::Expression {
            expression_type,
            params: deserialize_params(params),
        },
    }
}

fn deserialize_params(pairs: Vec<(String, SerializedValue)>) -> Params {
    pairs
        .into_iter()
        .map(|(key, value)| (key, deserialize_value(value)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tree flattening (linked chains -> vectors)
// ---------------------------------------------------------------------------

fn serialize_leaf(name: &str, behavior_id: Option<i64>, params: &Params) -> SerializedLeaf {
    SerializedLeaf {
        name: name.to_owned(),
        behavior_id,
        params: serialize_params(params),
    }
}

fn flatten_chain(head: &Response) -> Vec<SerializedResponse> {
    head.chain().map(serialize_response).collect()
}

fn serialize_response(node: &Response) -> SerializedResponse {
    let kind = match node.kind() {
        ResponseKind::Empty => SerializedKind::Empty,
        ResponseKind::Action { name } => SerializedKind::Action(name.clone()),
        ResponseKind::If {
            condition,
            then,
            otherwise,
        } => SerializedKind::If {
            condition: condition
                .as_ref()
                .map(|c| serialize_leaf(&c.name, c.behavior_id, &c.params)),
            then: flatten_chain(then),
            otherwise: otherwise.as_deref().map(flatten_chain),
        },
        ResponseKind::Scoped { scope, body } => SerializedKind::Scoped {
            scope: serialize_scope(*scope),
            body: flatten_chain(body),
        },
    };
    SerializedResponse {
        kind,
        behavior_id: node.behavior_id(),
        params: serialize_params(node.params()),
    }
}

fn rule_to_serialized(rule: &Rule, source_text: Option<&str>) -> SerializedRule {
    SerializedRule {
        metadata: RuleMetadata {
            node_count: rule.node_count(),
            source_digest: source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes()),
        },
        trigger: rule
            .trigger
            .as_ref()
            .map(|t| serialize_leaf(&t.name, t.behavior_id, &t.params)),
        response: rule.response.as_deref().map(flatten_chain).unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// Tree unflattening (vectors -> linked chains)
// ---------------------------------------------------------------------------

fn unflatten_chain(
    items: Vec<SerializedResponse>,
) -> Result<Option<Arc<Response>>, DeserializeError> {
    let nodes = items
        .into_iter()
        .map(deserialize_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Response::link(nodes))
}

/// A `then` or `body` list, which must hold at least one node.
fn unflatten_branch(
    items: Vec<SerializedResponse>,
    what: &str,
) -> Result<Arc<Response>, DeserializeError> {
    unflatten_chain(items)?
        .ok_or_else(|| DeserializeError::Validation(format!("empty '{what}' list")))
}

fn deserialize_response(item: SerializedResponse) -> Result<Response, DeserializeError> {
    let node = match item.kind {
        SerializedKind::Empty => Response::empty(),
        SerializedKind::Action(name) => {
            Response::action(&name).map_err(|e| DeserializeError::Validation(e.to_string()))?
        }
        SerializedKind::If {
            condition,
            then,
            otherwise,
        } => {
            let otherwise = match otherwise {
                Some(items) => Some(unflatten_branch(items, "else")?),
                None => None,
            };
            let mut node = Response::if_then(unflatten_branch(then, "then")?).with_else(otherwise);
            if let Some(leaf) = condition {
                node = node.with_condition(Condition {
                    name: leaf.name,
                    behavior_id: leaf.behavior_id,
                    params: deserialize_params(leaf.params),
                });
            }
            node
        }
        SerializedKind::Scoped { scope, body } => {
            Response::scoped(deserialize_scope(scope), unflatten_branch(body, "body")?)
        }
    };
    let node = node.with_params(deserialize_params(item.params));
    Ok(match item.behavior_id {
        Some(id) => node.with_behavior_id(id),
        None => node,
    })
}

fn serialized_to_rule(ser: SerializedRule) -> Result<Rule, DeserializeError> {
    validate(&ser)?;
    let trigger = ser.trigger.map(|leaf| Trigger {
        name: leaf.name,
        behavior_id: leaf.behavior_id,
        params: deserialize_params(leaf.params),
    });
    let response = unflatten_chain(ser.response)?;
    Ok(Rule { trigger, response })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedRule) -> Result<(), DeserializeError> {
    let node_count = validate_chain(&ser.response)?;
    if ser.metadata.node_count != node_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} nodes but payload has {}",
            ser.metadata.node_count, node_count
        )));
    }
    if let Some(trigger) = &ser.trigger {
        validate_params(&trigger.params)?;
    }
    Ok(())
}

/// Checks a list and everything nested in it; returns its node count.
fn validate_chain(items: &[SerializedResponse]) -> Result<usize, DeserializeError> {
    let mut count = 0;
    for item in items {
        count += 1;
        validate_params(&item.params)?;
        match &item.kind {
            SerializedKind::Empty | SerializedKind::Action(_) => {}
            SerializedKind::If {
                condition,
                then,
                otherwise,
            } => {
                if let Some(condition) = condition {
                    validate_params(&condition.params)?;
                }
                count += validate_branch(then, "then")?;
                if let Some(otherwise) = otherwise {
                    count += validate_branch(otherwise, "else")?;
                }
            }
            SerializedKind::Scoped { body, .. } => {
                count += validate_branch(body, "body")?;
            }
        }
    }
    Ok(count)
}

fn validate_branch(items: &[SerializedResponse], what: &str) -> Result<usize, DeserializeError> {
    if items.is_empty() {
        return Err(DeserializeError::Validation(format!("empty '{what}' list")));
    }
    validate_chain(items)
}

/// Keys are written in sorted order, so anything else is corruption.
fn validate_params(params: &[(String, SerializedValue)]) -> Result<(), DeserializeError> {
    for window in params.windows(2) {
        if window[0].0 >= window[1].0 {
            return Err(DeserializeError::Validation(format!(
                "parameter keys out of order or duplicated at '{}'",
                window[1].0
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // a single rule never nears 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version, bytes[8..12] flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(rule: &Rule, source_text: Option<&str>) -> Result<Vec<u8>, SerializeError> {
    let serialized = rule_to_serialized(rule, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Rule, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedRule, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    serialized_to_rule(serialized)
}

/// BLAKE3 digest of the source text recorded in a snapshot, if any.
///
/// # Errors
///
/// Fails like [`Rule::from_bytes`] on a damaged snapshot.
pub fn source_digest(bytes: &[u8]) -> Result<Option<[u8; 32]>, DeserializeError> {
    let (_, payload_len, _) = read_header(bytes)?;
    let payload_end = HEADER_SIZE + payload_len as usize;
    let payload = bytes
        .get(HEADER_SIZE..payload_end)
        .ok_or(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        })?;
    let (serialized, _): (SerializedRule, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized.metadata.source_digest)
}

#[cfg(feature = "binary-cache")]
impl Rule {
    /// Serialize this rule to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata, so callers can tell when a cached snapshot is stale.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if encoding fails.
    pub fn to_bytes(&self, source_text: Option<&str>) -> Result<Vec<u8>, SerializeError> {
        encode(self, source_text)
    }

    /// Deserialize a rule from bytes produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] on format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializeError> {
        decode(bytes)
    }

    /// # Errors
    ///
    /// Returns [`SerializeError`] on encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DeserializeError`] on I/O, format, integrity, or validation
    /// failure.
    pub fn from_binary_file(path: impl AsRef<std::path::Path>) -> Result<Self, DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
