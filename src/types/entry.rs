use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Catalog description of a trigger, response or condition.
///
/// Entries come from the host and are read-only here. `name` is unique
/// within its table and is what rule nodes refer to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Behavior that must be active on the actor for the entry to be offered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param_specs: Vec<ParamSpec>,
    /// Triggers this entry may be used under; absent means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_filter: Option<BTreeSet<String>>,
    /// Enclosing node names this entry may be nested in; absent means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_type_filter: Option<BTreeSet<String>>,
    /// Parameters (in host JSON form) a freshly picked node starts with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_params: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Description of one parameter an entry expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<serde_json::Value>,
}

impl Entry {
    #[must_use]
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            name: name.to_owned(),
            category: category.to_owned(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_behavior(mut self, behavior_name: &str) -> Self {
        self.behavior_name = Some(behavior_name.to_owned());
        self
    }

    #[must_use]
    pub fn with_behavior_id(mut self, behavior_id: i64) -> Self {
        self.behavior_id = Some(behavior_id);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    #[must_use]
    pub fn with_param_spec(mut self, spec: ParamSpec) -> Self {
        self.param_specs.push(spec);
        self
    }

    #[must_use]
    pub fn with_trigger_filter<'a>(mut self, triggers: impl IntoIterator<Item = &'a str>) -> Self {
        self.trigger_filter = Some(triggers.into_iter().map(str::to_owned).collect());
        self
    }

    #[must_use]
    pub fn with_parent_type_filter<'a>(
        mut self,
        parents: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.parent_type_filter = Some(parents.into_iter().map(str::to_owned).collect());
        self
    }

    /// Starting parameters in host JSON form. Non-object values are ignored.
    #[must_use]
    pub fn with_initial_params(mut self, params: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = params {
            self.initial_params = Some(map);
        }
        self
    }

    /// Text a picker shows for this entry.
    #[must_use]
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn param_spec(&self, name: &str) -> Option<&ParamSpec> {
        self.param_specs.iter().find(|spec| spec.name == name)
    }
}

impl ParamSpec {
    #[must_use]
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: Some(kind.to_owned()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_host_entry() {
        let json = r#"{
            "name": "move toward",
            "category": "motion",
            "behaviorName": "Moving",
            "paramSpecs": [{ "name": "speed", "type": "f", "initialValue": 6 }],
            "triggerFilter": ["tap", "press"]
        }"#;
        let entry: Entry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.name, "move toward");
        assert_eq!(entry.behavior_name.as_deref(), Some("Moving"));
        assert_eq!(entry.param_spec("speed").unwrap().kind.as_deref(), Some("f"));
        assert!(entry.trigger_filter.as_ref().unwrap().contains("press"));
        assert!(entry.parent_type_filter.is_none());
    }

    #[test]
    fn label_prefers_description() {
        let entry = Entry::new("wait", "logic");
        assert_eq!(entry.label(), "wait");
        assert_eq!(entry.with_description("Wait a moment").label(), "Wait a moment");
    }

    #[test]
    fn initial_params_require_object() {
        let entry = Entry::new("wait", "logic").with_initial_params(serde_json::json!(3));
        assert!(entry.initial_params.is_none());
        let entry = Entry::new("wait", "logic")
            .with_initial_params(serde_json::json!({ "duration": 1 }));
        assert_eq!(entry.initial_params.unwrap().len(), 1);
    }
}
