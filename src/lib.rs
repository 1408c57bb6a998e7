//! Copy-on-write editing for trigger/response rule trees.
//!
//! A [`Rule`] pairs one optional [`Trigger`] with a list of [`Response`]s.
//! Responses named `if`, `repeat`, `act on` and `act on other` own nested
//! lists, so a rule is a tree addressed by [`ResponsePath`]s. Edits never
//! mutate: [`Rule::apply`] returns a new rule that shares every untouched
//! subtree with the old one, which makes undo a matter of keeping the old
//! value around.
//!
//! ```
//! use rulegraph::{Edit, Response, ResponsePath, Rule, Trigger};
//!
//! let rule = Rule::new()
//!     .with_trigger(Trigger::new("collide"))
//!     .with_response(Response::action("play sound").unwrap());
//!
//! let wrapped = rule.apply(&ResponsePath::root(), Edit::WrapInCondition).unwrap();
//! assert_eq!(wrapped.top_level_names(), vec!["if"]);
//! assert_eq!(rule.top_level_names(), vec!["play sound"]);
//! ```

pub mod edit;
mod error;
pub mod json;
mod locate;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use edit::Edit;
pub use error::RuleGraphError;
pub use json::JsonError;
pub use parse::ParseError;
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    expression, find_entry, is_entry_visible, is_structural_name, Catalog, Category, Chain,
    Condition, EditError, Entry, EntryTable, FilterContext, ParamSpec, Params, PreviewLine,
    PreviewRow, Response, ResponseKind, ResponsePath, Rule, Scope, Step, Trigger, Value,
    CONDITION_CATEGORY_ORDER, EMPTY_NAME, IF_NAME, RESPONSE_CATEGORY_ORDER, RULES_BEHAVIOR_ID,
    TRIGGER_CATEGORY_ORDER,
};
