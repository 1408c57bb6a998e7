use std::path::Path;

use serde::{Deserialize, Serialize};

use super::entry::Entry;
use super::filter::{is_entry_visible, FilterContext};
use crate::error::RuleGraphError;
use crate::json::JsonError;

/// Picker order for trigger categories.
pub const TRIGGER_CATEGORY_ORDER: &[&str] =
    &["general", "controls", "state", "motion", "camera", "draw"];

/// Picker order for response categories.
pub const RESPONSE_CATEGORY_ORDER: &[&str] = &[
    "general",
    "behavior",
    "tell other actors",
    "logic",
    "state",
    "visible",
    "motion",
    "sound",
    "camera",
    "meta",
];

/// Picker order for condition categories.
pub const CONDITION_CATEGORY_ORDER: &[&str] = &["state", "collision", "random", "camera", "draw"];

/// Exact-name lookup. An unknown name, `"none"` included, is `None`.
#[must_use]
pub fn find_entry<'a>(name: &str, table: &'a [Entry]) -> Option<&'a Entry> {
    table.iter().find(|entry| entry.name == name)
}

/// Entries of one category, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct Category<'a> {
    pub name: &'a str,
    pub entries: Vec<&'a Entry>,
}

/// One of the three catalog tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryTable {
    entries: Vec<Entry>,
}

impl EntryTable {
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Entry> {
        find_entry(name, &self.entries)
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries grouped by category. Categories listed in `order` come first
    /// in that order, the rest follow in first-seen order. Categories with
    /// no entries are left out.
    #[must_use]
    pub fn grouped(&self, order: &[&str]) -> Vec<Category<'_>> {
        self.group(order, |_| true)
    }

    /// Entries the picker should offer in `ctx`, in table order.
    #[must_use]
    pub fn visible(&self, ctx: &FilterContext) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|entry| is_entry_visible(entry, ctx))
            .collect()
    }

    /// Like [`grouped`](Self::grouped) but restricted to visible entries, so
    /// a category appears only when at least one of its entries is visible.
    #[must_use]
    pub fn visible_categories(&self, ctx: &FilterContext, order: &[&str]) -> Vec<Category<'_>> {
        self.group(order, |entry| is_entry_visible(entry, ctx))
    }

    fn group(&self, order: &[&str], keep: impl Fn(&Entry) -> bool) -> Vec<Category<'_>> {
        let mut groups: Vec<Category<'_>> = Vec::new();
        for entry in self.entries.iter().filter(|entry| keep(entry)) {
            match groups.iter_mut().find(|g| g.name == entry.category) {
                Some(group) => group.entries.push(entry),
                None => groups.push(Category {
                    name: &entry.category,
                    entries: vec![entry],
                }),
            }
        }
        groups.sort_by_key(|g| {
            order
                .iter()
                .position(|name| *name == g.name)
                .unwrap_or(order.len())
        });
        groups
    }
}

impl From<Vec<Entry>> for EntryTable {
    fn from(entries: Vec<Entry>) -> Self {
        Self::new(entries)
    }
}

impl<'a> IntoIterator for &'a EntryTable {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The three lookup tables a host supplies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub triggers: EntryTable,
    #[serde(default)]
    pub responses: EntryTable,
    #[serde(default)]
    pub conditions: EntryTable,
}

impl Catalog {
    /// Parse a catalog from JSON of the form
    /// `{"triggers": [..], "responses": [..], "conditions": [..]}`.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Syntax`] if the text is not a valid catalog.
    pub fn from_json_str(json: &str) -> Result<Self, JsonError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        tracing::debug!(
            triggers = catalog.triggers.len(),
            responses = catalog.responses.len(),
            conditions = catalog.conditions.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleGraphError::Io`] if the file cannot be read, or
    /// [`RuleGraphError::Json`] if its contents are not a valid catalog.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RuleGraphError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&text)?)
    }

    #[must_use]
    pub fn trigger(&self, name: &str) -> Option<&Entry> {
        self.triggers.find(name)
    }

    #[must_use]
    pub fn response(&self, name: &str) -> Option<&Entry> {
        self.responses.find(name)
    }

    #[must_use]
    pub fn condition(&self, name: &str) -> Option<&Entry> {
        self.conditions.find(name)
    }
}
