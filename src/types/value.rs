use std::collections::BTreeMap;
use std::fmt;

/// Opaque parameter payload carried by rule nodes.
///
/// The editing engine never interprets values; it only moves them around.
/// Every variant maps onto a JSON value so rules survive the host's storage
/// round trip unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    List(Vec<Value>),
    Map(Params),
    /// A host expression such as `{ expressionType: "random", params: {...} }`.
    Expression {
        expression_type: String,
        params: Params,
    },
}

/// Non-structural parameters of a node, keyed by parameter name.
///
/// Ordered so that printing and encoding are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: BTreeMap<String, Value>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.to_owned(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Params> for Value {
    fn from(v: Params) -> Self {
        Value::Map(v)
    }
}

/// Shorthand for [`Value::Expression`].
#[must_use]
pub fn expression(expression_type: &str, params: Params) -> Value {
    Value::Expression {
        expression_type: expression_type.to_owned(),
        params,
    }
}

/// Writes `"..."` with the escapes the rule notation understands.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// Identifiers print bare; anything else (spaces, keywords) is quoted.
pub(crate) fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    if is_bare_ident(key) {
        f.write_str(key)
    } else {
        write_quoted(f, key)
    }
}

pub(crate) fn is_bare_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(
            s,
            "if" | "else" | "when" | "none" | "true" | "false" | "null"
        )
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_key(f, k)?;
            write!(f, ": {v}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            // Debug keeps the decimal point so floats read back as floats.
            Value::Float(v) => write!(f, "{v:?}"),
            Value::String(v) => write_quoted(f, v),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(params) => {
                let inner = params.to_string();
                write!(f, "{{{}}}", &inner[1..inner.len() - 1])
            }
            Value::Expression {
                expression_type,
                params,
            } => {
                f.write_str("$")?;
                write_key(f, expression_type)?;
                write!(f, "{params}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_i64() {
        assert_eq!(Value::from(42_i64), Value::Int(42));
    }

    #[test]
    fn from_f64() {
        assert_eq!(Value::from(3.5_f64), Value::Float(3.5));
    }

    #[test]
    fn from_str() {
        assert_eq!(Value::from("hello"), Value::String("hello".to_owned()));
    }

    #[test]
    fn params_builder_orders_keys() {
        let params = Params::new().with("speed", 2_i64).with("angle", 90_i64);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["angle", "speed"]);
        assert_eq!(params.len(), 2);
        assert!(params.contains_key("speed"));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::String("a\"b".into()).to_string(), r#""a\"b""#);
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn display_map_and_expression() {
        let map = Value::Map(Params::new().with("x", 1_i64));
        assert_eq!(map.to_string(), "{x: 1}");

        let expr = expression("random", Params::new().with("min", 0_i64).with("max", 10_i64));
        assert_eq!(expr.to_string(), "$random(max: 10, min: 0)");
    }

    #[test]
    fn keys_with_spaces_are_quoted() {
        let params = Params::new().with("tag name", "wall");
        assert_eq!(params.to_string(), r#"("tag name": "wall")"#);
    }

    #[test]
    fn keywords_are_not_bare() {
        assert!(is_bare_ident("count"));
        assert!(!is_bare_ident("if"));
        assert!(!is_bare_ident("act on"));
        assert!(!is_bare_ident("9lives"));
    }
}
