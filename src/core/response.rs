//! The parsed model reply: one envelope for structured commands and free text
use crate::core::condition::CompositeCondition;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::Display;

/// Sort/group direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl Default for SortDir {
    fn default() -> Self {
        Self::Asc
    }
}

/// One sort criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub dir: SortDir,
}

/// One grouping criterion; groups order like an outer sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub field: String,
    #[serde(default)]
    pub dir: SortDir,
}

/// One highlight rule: a composite condition plus an opaque `cells` object
/// some replies carry. `cells` is passed through verbatim, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighlightRule {
    #[serde(flatten)]
    pub condition: CompositeCondition,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub cells: serde_json::Map<String, Value>,
}

/// The response envelope every turn produces, structured command and
/// natural-language answer alike.
///
/// Each view dimension is tri-state on the wire: an absent key means "leave
/// untouched", an empty list (or explicit null for `filter`) means "clear",
/// and a value means "replace".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridOperationResponse {
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Vec<HighlightRule>>,
    /// `None` = key absent, `Some(None)` = explicit null, `Some(Some(_))` = set
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub filter: Option<Option<CompositeCondition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<GroupSpec>>,
    /// Marks the fixed assistant-off reply
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

/// Keys that identify a parsed JSON object as this envelope
pub const ENVELOPE_KEYS: [&str; 6] = ["messages", "highlight", "filter", "sort", "group", "disabled"];

impl GridOperationResponse {
    /// A reply that only carries a message and clears highlights, the shape
    /// used for natural-language answers and every fallback path.
    pub fn message_only(text: impl Into<String>) -> Self {
        Self {
            messages: vec![text.into()],
            highlight: Some(Vec::new()),
            ..Self::default()
        }
    }
}

/// Distinguishes an absent key from an explicit null during deserialization
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::condition::{Logic, Operator};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_filter_tristate_absent_null_value() {
        let absent: GridOperationResponse = serde_json::from_value(json!({"messages": []})).unwrap();
        assert_eq!(absent.filter, None);

        let null: GridOperationResponse =
            serde_json::from_value(json!({"messages": [], "filter": null})).unwrap();
        assert_eq!(null.filter, Some(None));

        let set: GridOperationResponse = serde_json::from_value(json!({
            "messages": [],
            "filter": {"logic": "and", "filters": [
                {"field": "ownerName", "operator": "eq", "value": "Loknath Mishra"}
            ]}
        }))
        .unwrap();
        let condition = set.filter.unwrap().unwrap();
        assert_eq!(condition.logic, Logic::And);
        assert_eq!(condition.filters[0].operator, Operator::Eq);
    }

    #[test]
    fn test_tristate_survives_reserialization() {
        let original = json!({
            "messages": ["Cleared all grid operations"],
            "filter": null,
            "highlight": [],
            "sort": [],
            "group": []
        });
        let parsed: GridOperationResponse = serde_json::from_value(original.clone()).unwrap();
        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back, original);

        // Absent keys stay absent
        let sparse: GridOperationResponse =
            serde_json::from_value(json!({"messages": ["hi"]})).unwrap();
        let back = serde_json::to_value(&sparse).unwrap();
        assert_eq!(back, json!({"messages": ["hi"]}));
    }

    #[test]
    fn test_highlight_rule_carries_cells_verbatim() {
        let rule: HighlightRule = serde_json::from_value(json!({
            "logic": "and",
            "filters": [{"field": "isLocked", "operator": "eq", "value": true}],
            "cells": {"isLockedStringValue": {"background": "#fff3cd"}}
        }))
        .unwrap();
        assert_eq!(rule.condition.filters.len(), 1);
        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            back["cells"],
            json!({"isLockedStringValue": {"background": "#fff3cd"}})
        );
    }

    #[test]
    fn test_message_only_clears_highlights() {
        let reply = GridOperationResponse::message_only("Processing: sort by name");
        assert_eq!(reply.messages, vec!["Processing: sort by name".to_string()]);
        assert_eq!(reply.highlight, Some(Vec::new()));
        assert_eq!(reply.filter, None);
        assert_eq!(reply.sort, None);
        assert_eq!(reply.group, None);
        assert!(!reply.disabled);
    }

    #[test]
    fn test_sort_dir_defaults_to_asc() {
        let spec: SortSpec = serde_json::from_value(json!({"field": "templateName"})).unwrap();
        assert_eq!(spec.dir, SortDir::Asc);
    }
}
