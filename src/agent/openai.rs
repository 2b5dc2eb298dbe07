// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model-driven planner via an OpenAI-compatible chat-completions API

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::planner::{Planner, PlannerDecision, PlannerError, ToolInvocation};
use super::tool::ToolSpec;

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Wire format of one planner decision
#[derive(serde::Deserialize)]
struct DecisionJson {
    action: String,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

pub struct OpenAiPlanner {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
    max_retries: usize,
}

impl OpenAiPlanner {
    pub fn new(
        api_base: &str,
        api_key: Option<String>,
        model: &str,
        max_retries: usize,
    ) -> Result<Self, PlannerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            max_retries,
        })
    }

    fn system_prompt(context: &str, tools: &[ToolSpec]) -> String {
        let mut prompt = String::new();
        prompt.push_str(context);
        prompt.push_str("\n\nYou have access to these tools:\n");
        for tool in tools {
            prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        }
        prompt.push_str(
            "\nRespond with exactly one JSON object and nothing else.\n\
             To call a tool: {\"action\": \"tool\", \"tool\": \"<name>\", \"input\": \"<input>\"}\n\
             To answer the user: {\"action\": \"final\", \"answer\": \"<answer>\"}\n\
             Only call a tool when its output is needed; answer directly otherwise.",
        );
        prompt
    }

    fn user_prompt(request: &str, history: &[ToolInvocation]) -> String {
        let mut prompt = format!("User request: {}", request);
        if !history.is_empty() {
            prompt.push_str("\n\nTool calls so far this turn:");
            for invocation in history {
                prompt.push_str(&format!(
                    "\n[{}] input: {}\nobservation: {}",
                    invocation.tool, invocation.input, invocation.output
                ));
            }
            prompt.push_str("\n\nDecide the next step.");
        }
        prompt
    }

    fn parse_decision(content: &str) -> Result<PlannerDecision, PlannerError> {
        // Models occasionally wrap the JSON in a code fence
        let trimmed = content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();

        let decision: DecisionJson = serde_json::from_str(trimmed)
            .map_err(|e| PlannerError::Protocol(format!("{}: {}", e, trimmed)))?;

        match decision.action.as_str() {
            "tool" => {
                let tool = decision
                    .tool
                    .ok_or_else(|| PlannerError::Protocol("tool action without tool name".to_string()))?;
                Ok(PlannerDecision::CallTool {
                    tool,
                    input: decision.input.unwrap_or_default(),
                })
            }
            "final" => {
                let answer = decision
                    .answer
                    .ok_or_else(|| PlannerError::Protocol("final action without answer".to_string()))?;
                Ok(PlannerDecision::Finish { answer })
            }
            other => Err(PlannerError::Protocol(format!("unknown action: {}", other))),
        }
    }

    async fn call_once(&self, request: &ChatRequest, api_key: &str) -> Result<String, PlannerError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PlannerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| PlannerError::Protocol("empty choices in response".to_string()))
    }

    fn is_transient(error: &PlannerError) -> bool {
        match error {
            PlannerError::Http(_) => true,
            PlannerError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[async_trait]
impl Planner for OpenAiPlanner {
    async fn decide(
        &self,
        request: &str,
        context: &str,
        tools: &[ToolSpec],
        history: &[ToolInvocation],
    ) -> Result<PlannerDecision, PlannerError> {
        let api_key = self.api_key.as_ref().ok_or(PlannerError::MissingApiKey)?;

        let chat_request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(context, tools),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Self::user_prompt(request, history),
                },
            ],
            temperature: 0.0,
        };

        let attempts = self.max_retries.max(1);
        let mut last_error = String::new();
        for attempt in 0..attempts {
            match self.call_once(&chat_request, api_key).await {
                Ok(content) => {
                    debug!("Planner decision: {}", content.trim());
                    return Self::parse_decision(&content);
                }
                Err(e) if Self::is_transient(&e) => {
                    last_error = e.to_string();
                    // No point backing off when there is no attempt left
                    if attempt + 1 == attempts {
                        break;
                    }
                    let delay = Duration::from_millis(500u64 * (1u64 << attempt.min(5)));
                    warn!(
                        "Transient reasoning-service failure (attempt {}/{}): {}. Retrying in {:?}",
                        attempt + 1,
                        attempts,
                        last_error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(PlannerError::RetriesExhausted {
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_decision() {
        let decision = OpenAiPlanner::parse_decision(
            r#"{"action": "tool", "tool": "document_search", "input": "axle load"}"#,
        )
        .unwrap();
        assert_eq!(
            decision,
            PlannerDecision::CallTool {
                tool: "document_search".to_string(),
                input: "axle load".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_final_decision() {
        let decision =
            OpenAiPlanner::parse_decision(r#"{"action": "final", "answer": "11,500 kg"}"#).unwrap();
        assert_eq!(
            decision,
            PlannerDecision::Finish {
                answer: "11,500 kg".to_string()
            }
        );
    }

    #[test]
    fn test_parse_decision_with_code_fence() {
        let content = "```json\n{\"action\": \"final\", \"answer\": \"ok\"}\n```";
        let decision = OpenAiPlanner::parse_decision(content).unwrap();
        assert!(matches!(decision, PlannerDecision::Finish { .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_action() {
        let err = OpenAiPlanner::parse_decision(r#"{"action": "think"}"#);
        assert!(matches!(err, Err(PlannerError::Protocol(_))));
    }

    #[test]
    fn test_parse_rejects_tool_without_name() {
        let err = OpenAiPlanner::parse_decision(r#"{"action": "tool", "input": "x"}"#);
        assert!(matches!(err, Err(PlannerError::Protocol(_))));
    }

    #[test]
    fn test_transient_classification() {
        assert!(OpenAiPlanner::is_transient(&PlannerError::Api {
            status: 429,
            message: String::new()
        }));
        assert!(OpenAiPlanner::is_transient(&PlannerError::Api {
            status: 503,
            message: String::new()
        }));
        assert!(!OpenAiPlanner::is_transient(&PlannerError::Api {
            status: 401,
            message: String::new()
        }));
        assert!(!OpenAiPlanner::is_transient(&PlannerError::Protocol(
            String::new()
        )));
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let tools = vec![
            ToolSpec {
                name: "note_saver".to_string(),
                description: "saves a note".to_string(),
            },
            ToolSpec {
                name: "document_search".to_string(),
                description: "searches documents".to_string(),
            },
        ];
        let prompt = OpenAiPlanner::system_prompt("role context", &tools);
        assert!(prompt.contains("role context"));
        assert!(prompt.contains("note_saver"));
        assert!(prompt.contains("document_search"));
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_retries() {
        // Nothing listens on port 1, so every attempt fails with a
        // connection error, which is classified as transient
        let planner = OpenAiPlanner::new(
            "http://127.0.0.1:1",
            Some("sk-test".to_string()),
            "gpt-4o-mini",
            2,
        )
        .unwrap();

        let result = planner.decide("question", "ctx", &[], &[]).await;
        match result {
            Err(PlannerError::RetriesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 2);
                assert!(!last_error.is_empty());
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_fast() {
        let planner = OpenAiPlanner::new("https://api.openai.com/v1", None, "gpt-4o-mini", 3).unwrap();
        let result = planner.decide("question", "ctx", &[], &[]).await;
        assert!(matches!(result, Err(PlannerError::MissingApiKey)));
    }
}
