//! Assistant orchestrator: one instruction in, one response envelope out
use crate::config::AssistantConfig;
use crate::core::record::{GridSchema, Record};
use crate::core::response::GridOperationResponse;
use crate::services::gateway::ChatGateway;
use crate::services::interpreter;
use crate::services::prompt::PromptBuilder;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Drives the full turn pipeline: classify and build the prompt, call the
/// gateway, interpret the reply. Always yields a well-formed envelope; the
/// only failure mode visible to callers is a message.
#[derive(Debug)]
pub struct Assistant {
    config: AssistantConfig,
    prompts: PromptBuilder,
    gateway: ChatGateway,
    turn: AtomicU64,
}

impl Assistant {
    pub fn new(config: AssistantConfig, schema: GridSchema) -> anyhow::Result<Self> {
        let gateway = ChatGateway::new(&config)?;
        Ok(Self {
            config,
            prompts: PromptBuilder::new(schema),
            gateway,
            turn: AtomicU64::new(0),
        })
    }

    /// Run one instruction turn. The record set flows in by parameter; the
    /// disabled toggle short-circuits before any prompt construction or
    /// network traffic.
    pub async fn respond(&self, instruction: &str, records: &[Record]) -> GridOperationResponse {
        if !self.config.enabled {
            debug!("assistant disabled, skipping gateway call");
            return interpreter::disabled_reply();
        }

        let prompt = self.prompts.build(instruction, records);
        match self
            .gateway
            .send(&prompt.system, &prompt.user, &self.config)
            .await
        {
            Ok(raw) => interpreter::interpret_reply(&raw, instruction),
            Err(err) => {
                warn!("chat transport failed: {err}");
                interpreter::placeholder(instruction)
            }
        }
    }

    /// Like [`Assistant::respond`], but last-request-wins: if a newer turn
    /// was issued while this one was in flight, the reply is reported as
    /// superseded (`None`) and must be discarded, never applied.
    pub async fn respond_latest(
        &self,
        instruction: &str,
        records: &[Record],
    ) -> Option<GridOperationResponse> {
        let ticket = self.turn.fetch_add(1, Ordering::SeqCst) + 1;
        let response = self.respond(instruction, records).await;
        if self.turn.load(Ordering::SeqCst) != ticket {
            debug!("discarding superseded reply for turn {ticket}");
            return None;
        }
        Some(response)
    }
}

/// Normalize an inbound instruction payload to one canonical string.
///
/// Accepted shapes, checked in order: `{"contents": [{"text": …}]}`,
/// `{"contents": [{"content": …}]}`, `{"contents": ["…"]}`,
/// `{"promptMessage": …}`, and a bare JSON string. Anything else is
/// rejected rather than probed further.
pub fn canonical_instruction(payload: &Value) -> Option<String> {
    match payload {
        Value::String(s) => non_empty(s),
        Value::Object(map) => {
            if let Some(Value::Array(contents)) = map.get("contents") {
                return match contents.first()? {
                    Value::String(s) => non_empty(s),
                    Value::Object(entry) => entry
                        .get("text")
                        .or_else(|| entry.get("content"))
                        .and_then(Value::as_str)
                        .and_then(non_empty),
                    _ => None,
                };
            }
            match map.get("promptMessage") {
                Some(Value::String(s)) => non_empty(s),
                _ => None,
            }
        }
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_instruction_accepted_shapes() {
        let cases = [
            (json!("highlight locked templates"), "highlight locked templates"),
            (json!({"contents": [{"text": "sort by name"}]}), "sort by name"),
            (json!({"contents": [{"content": "group by owner"}]}), "group by owner"),
            (json!({"contents": ["filter locked"]}), "filter locked"),
            (json!({"promptMessage": "  clear everything  "}), "clear everything"),
        ];
        for (payload, expected) in cases {
            assert_eq!(canonical_instruction(&payload).as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_canonical_instruction_rejected_shapes() {
        let cases = [
            json!(null),
            json!(42),
            json!({"contents": []}),
            json!({"contents": [42]}),
            json!({"contents": "not an array"}),
            json!({"prompt": "wrong key"}),
            json!(""),
            json!({"promptMessage": "   "}),
        ];
        for payload in cases {
            assert_eq!(canonical_instruction(&payload), None, "payload: {payload}");
        }
    }

    #[tokio::test]
    async fn test_disabled_toggle_short_circuits() {
        let config = AssistantConfig {
            enabled: false,
            // An unroutable endpoint: any network attempt would fail loudly
            endpoint: "http://127.0.0.1:1/v1/chat/completions".to_string(),
            ..AssistantConfig::default()
        };
        let assistant = Assistant::new(config, GridSchema::reporting_templates()).unwrap();
        let reply = assistant.respond("highlight locked templates", &[]).await;
        assert!(reply.disabled);
        assert_eq!(reply.messages, vec![interpreter::DISABLED_MESSAGE.to_string()]);
    }
}
