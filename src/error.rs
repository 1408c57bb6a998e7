use thiserror::Error;

use crate::json::JsonError;
use crate::parse::ParseError;
use crate::types::EditError;

/// Unified error type covering editing, parsing, JSON interchange, and I/O.
///
/// Returned by convenience methods like [`Rule::from_dsl()`](crate::Rule::from_dsl)
/// and [`Catalog::from_file()`](crate::Catalog::from_file).
#[derive(Debug, Error)]
pub enum RuleGraphError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Json(#[from] JsonError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
