//! Reply interpretation: structured command vs natural language vs fallback
use crate::core::response::{ENVELOPE_KEYS, GridOperationResponse};
use serde_json::Value;
use tracing::debug;

/// The fixed reply used when the assistant toggle is off
pub const DISABLED_MESSAGE: &str =
    "AI assistant is currently disabled. Please enable it to use AI features.";

/// Normalize one raw model reply into a response envelope.
///
/// A reply that parses as a JSON object carrying at least one envelope key
/// passes through verbatim. Valid JSON of the wrong shape, or a reply that
/// is not JSON at all, becomes a natural-language answer. An empty reply
/// becomes the processing placeholder so the caller always has something
/// user-visible. This function never fails.
pub fn interpret_reply(raw: &str, instruction: &str) -> GridOperationResponse {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return placeholder(instruction);
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) if is_envelope(&value) => match serde_json::from_value(value) {
            Ok(response) => response,
            Err(err) => {
                debug!("envelope-shaped reply failed to parse, treating as text: {err}");
                natural_language(trimmed)
            }
        },
        Ok(_) => natural_language(trimmed),
        Err(_) => natural_language(trimmed),
    }
}

/// Wrap free text into a message-only reply
pub fn natural_language(text: &str) -> GridOperationResponse {
    GridOperationResponse::message_only(text.trim())
}

/// The fallback for empty replies and every transport failure
pub fn placeholder(instruction: &str) -> GridOperationResponse {
    GridOperationResponse::message_only(format!("Processing: {instruction}"))
}

/// The assistant-off short-circuit reply
pub fn disabled_reply() -> GridOperationResponse {
    GridOperationResponse {
        disabled: true,
        ..GridOperationResponse::message_only(DISABLED_MESSAGE)
    }
}

fn is_envelope(value: &Value) -> bool {
    value
        .as_object()
        .map(|object| object.keys().any(|key| ENVELOPE_KEYS.contains(&key.as_str())))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_structured_reply_round_trips_unchanged() {
        let reply = json!({
            "messages": ["Highlighted locked templates"],
            "highlight": [{"logic": "and", "filters": [
                {"field": "isLocked", "operator": "eq", "value": true}
            ], "cells": {}}]
        });
        let raw = serde_json::to_string(&reply).unwrap();
        let interpreted = interpret_reply(&raw, "highlight locked templates");
        assert_eq!(serde_json::to_value(&interpreted).unwrap(), reply);
    }

    #[test]
    fn test_structured_reply_with_whitespace_still_parses() {
        let raw = "  \n {\"messages\": [\"ok\"], \"sort\": [{\"field\": \"templateName\", \"dir\": \"asc\"}]} \n";
        let interpreted = interpret_reply(raw, "sort by name");
        assert_eq!(interpreted.messages, vec!["ok".to_string()]);
        assert_eq!(interpreted.sort.unwrap().len(), 1);
    }

    #[test]
    fn test_non_json_reply_becomes_natural_language() {
        let raw = "  Loknath Mishra owns the most templates.  ";
        let interpreted = interpret_reply(raw, "who owns the most?");
        assert_eq!(
            interpreted,
            GridOperationResponse::message_only("Loknath Mishra owns the most templates.")
        );
    }

    #[test]
    fn test_valid_json_with_wrong_keys_becomes_natural_language() {
        let raw = r#"{"answer": "42", "confidence": 0.9}"#;
        let interpreted = interpret_reply(raw, "anything");
        assert_eq!(interpreted.messages, vec![raw.to_string()]);
        assert_eq!(interpreted.highlight, Some(Vec::new()));
    }

    #[test]
    fn test_json_scalars_and_arrays_become_natural_language() {
        for raw in ["\"just a string\"", "42", "[1, 2, 3]"] {
            let interpreted = interpret_reply(raw, "anything");
            assert_eq!(interpreted.messages, vec![raw.to_string()]);
        }
    }

    #[test]
    fn test_envelope_keyed_but_malformed_values_become_natural_language() {
        let raw = r#"{"filter": 42}"#;
        let interpreted = interpret_reply(raw, "anything");
        assert_eq!(interpreted.messages, vec![raw.to_string()]);
    }

    #[test]
    fn test_empty_reply_becomes_processing_placeholder() {
        let interpreted = interpret_reply("   ", "sort by template name");
        assert_eq!(
            interpreted,
            GridOperationResponse::message_only("Processing: sort by template name")
        );
    }

    #[test]
    fn test_disabled_reply_shape() {
        let reply = disabled_reply();
        assert!(reply.disabled);
        assert_eq!(reply.messages, vec![DISABLED_MESSAGE.to_string()]);
        assert_eq!(reply.highlight, Some(Vec::new()));
    }
}
