mod catalog;
mod entry;
mod error;
mod filter;
mod node;
mod path;
mod preview;
mod rule;
mod value;

pub use catalog::{
    find_entry, Catalog, Category, EntryTable, CONDITION_CATEGORY_ORDER, RESPONSE_CATEGORY_ORDER,
    TRIGGER_CATEGORY_ORDER,
};
pub use entry::{Entry, ParamSpec};
pub use error::EditError;
pub use filter::{is_entry_visible, FilterContext};
pub use node::{
    is_structural_name, Chain, Condition, Response, ResponseKind, Scope, Trigger, EMPTY_NAME,
    IF_NAME, RULES_BEHAVIOR_ID,
};
pub use path::{ResponsePath, Step};
pub use preview::{PreviewLine, PreviewRow};
pub use rule::Rule;
pub use value::{expression, Params, Value};

pub(crate) use value::write_key;
