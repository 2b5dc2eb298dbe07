// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tool router: the per-turn reasoning loop
//!
//! Each step, the planner either selects a tool to invoke or emits the
//! final answer. The router enforces a step ceiling so a planner that keeps
//! calling tools cannot loop forever, and keeps the invocation history for
//! the turn. The router itself is stateless across turns.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::planner::{Planner, PlannerDecision, PlannerError, ToolInvocation};
use super::tool::{ToolError, ToolRegistry};

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Reasoning service failed: {0}")]
    Planner(#[from] PlannerError),

    #[error("Tool '{tool}' failed: {source}")]
    Tool {
        tool: String,
        #[source]
        source: ToolError,
    },

    #[error("Could not complete the request within {max_steps} reasoning steps")]
    StepLimitExceeded { max_steps: usize },
}

impl AgentError {
    /// Get user-friendly error message for API responses
    pub fn user_message(&self) -> String {
        match self {
            AgentError::StepLimitExceeded { .. } => {
                "The assistant could not complete this request. Try rephrasing the question.".to_string()
            }
            AgentError::Planner(PlannerError::MissingApiKey) => {
                "API key is missing - query operations require OPENAI_API_KEY".to_string()
            }
            AgentError::Planner(PlannerError::RetriesExhausted { .. }) => {
                "The reasoning service is currently unavailable. Try again later.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Configuration for the router loop
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Maximum planner steps per turn, counting the final answer
    pub max_steps: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { max_steps: 8 }
    }
}

/// Result of one completed turn
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub answer: String,
    /// Every tool invocation made during the turn, in order
    pub invocations: Vec<ToolInvocation>,
}

pub struct AgentRouter {
    planner: Arc<dyn Planner>,
    registry: ToolRegistry,
    context: String,
    config: RouterConfig,
}

impl AgentRouter {
    pub fn new(
        planner: Arc<dyn Planner>,
        registry: ToolRegistry,
        context: impl Into<String>,
        config: RouterConfig,
    ) -> Self {
        Self {
            planner,
            registry,
            context: context.into(),
            config,
        }
    }

    /// Run one turn: plan, invoke tools as directed, return the final answer.
    pub async fn run(&self, request: &str) -> Result<AgentOutcome, AgentError> {
        let specs = self.registry.specs();
        let mut history: Vec<ToolInvocation> = Vec::new();

        for step in 0..self.config.max_steps {
            let decision = self
                .planner
                .decide(request, &self.context, &specs, &history)
                .await?;

            match decision {
                PlannerDecision::Finish { answer } => {
                    info!(
                        "Turn finished after {} tool call(s) in {} step(s)",
                        history.len(),
                        step + 1
                    );
                    return Ok(AgentOutcome {
                        answer,
                        invocations: history,
                    });
                }
                PlannerDecision::CallTool { tool, input } => {
                    let Some(handler) = self.registry.get(&tool) else {
                        // Feed the mistake back instead of aborting; the
                        // planner can recover by picking a listed tool
                        warn!("Planner selected unknown tool '{}'", tool);
                        history.push(ToolInvocation {
                            tool: tool.clone(),
                            input,
                            output: format!(
                                "error: unknown tool '{}'. Available tools: {}",
                                tool,
                                specs
                                    .iter()
                                    .map(|s| s.name.as_str())
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            ),
                        });
                        continue;
                    };

                    info!("Step {}: invoking tool '{}'", step + 1, tool);
                    let output = handler
                        .call(&input)
                        .await
                        .map_err(|source| AgentError::Tool {
                            tool: tool.clone(),
                            source,
                        })?;

                    history.push(ToolInvocation {
                        tool,
                        input,
                        output,
                    });
                }
            }
        }

        warn!(
            "Step ceiling of {} reached without a final answer",
            self.config.max_steps
        );
        Err(AgentError::StepLimitExceeded {
            max_steps: self.config.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::planner::ScriptedPlanner;
    use crate::agent::tool::{Tool, ToolSpec};
    use async_trait::async_trait;

    struct StaticTool {
        name: &'static str,
        output: &'static str,
    }

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "static test tool"
        }
        async fn call(&self, _input: &str) -> Result<String, ToolError> {
            Ok(self.output.to_string())
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StaticTool {
            name: "document_search",
            output: "Maximum axle load is 11,500 kg",
        }));
        registry.register(Arc::new(StaticTool {
            name: "note_saver",
            output: "note saved",
        }));
        registry
    }

    #[tokio::test]
    async fn test_direct_answer_makes_no_tool_calls() {
        let planner = Arc::new(ScriptedPlanner::new(vec![PlannerDecision::Finish {
            answer: "Hello".to_string(),
        }]));
        let router = AgentRouter::new(planner, registry(), "ctx", RouterConfig::default());

        let outcome = router.run("hi").await.unwrap();
        assert_eq!(outcome.answer, "Hello");
        assert!(outcome.invocations.is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let planner = Arc::new(ScriptedPlanner::new(vec![
            PlannerDecision::CallTool {
                tool: "document_search".to_string(),
                input: "axle load".to_string(),
            },
            PlannerDecision::Finish {
                answer: "11,500 kg".to_string(),
            },
        ]));
        let router = AgentRouter::new(planner, registry(), "ctx", RouterConfig::default());

        let outcome = router.run("What is the maximum axle load?").await.unwrap();
        assert_eq!(outcome.answer, "11,500 kg");
        assert_eq!(outcome.invocations.len(), 1);
        assert_eq!(outcome.invocations[0].tool, "document_search");
        assert!(outcome.invocations[0].output.contains("11,500 kg"));
    }

    #[tokio::test]
    async fn test_step_ceiling_stops_infinite_loop() {
        let planner = Arc::new(ScriptedPlanner::repeating(PlannerDecision::CallTool {
            tool: "document_search".to_string(),
            input: "again".to_string(),
        }));
        let router = AgentRouter::new(
            planner,
            registry(),
            "ctx",
            RouterConfig { max_steps: 3 },
        );

        let err = router.run("loop forever").await;
        assert!(matches!(
            err,
            Err(AgentError::StepLimitExceeded { max_steps: 3 })
        ));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_fed_back_as_observation() {
        let planner = Arc::new(ScriptedPlanner::new(vec![
            PlannerDecision::CallTool {
                tool: "web_search".to_string(),
                input: "axle load".to_string(),
            },
            PlannerDecision::Finish {
                answer: "recovered".to_string(),
            },
        ]));
        let router = AgentRouter::new(planner, registry(), "ctx", RouterConfig::default());

        let outcome = router.run("question").await.unwrap();
        assert_eq!(outcome.answer, "recovered");
        assert_eq!(outcome.invocations.len(), 1);
        assert!(outcome.invocations[0].output.contains("unknown tool"));
        assert!(outcome.invocations[0].output.contains("document_search"));
    }

    #[tokio::test]
    async fn test_planner_sees_tool_specs() {
        struct SpecCheckingPlanner;

        #[async_trait]
        impl crate::agent::Planner for SpecCheckingPlanner {
            async fn decide(
                &self,
                _request: &str,
                _context: &str,
                tools: &[ToolSpec],
                _history: &[ToolInvocation],
            ) -> Result<PlannerDecision, PlannerError> {
                assert_eq!(tools.len(), 2);
                assert!(tools.iter().any(|t| t.name == "document_search"));
                assert!(tools.iter().any(|t| t.name == "note_saver"));
                Ok(PlannerDecision::Finish {
                    answer: "ok".to_string(),
                })
            }
        }

        let router = AgentRouter::new(
            Arc::new(SpecCheckingPlanner),
            registry(),
            "ctx",
            RouterConfig::default(),
        );
        assert_eq!(router.run("q").await.unwrap().answer, "ok");
    }
}
