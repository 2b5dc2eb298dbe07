// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Planner abstraction for the tool router
//!
//! A planner looks at the request, the role context, the tool specs, and
//! the invocations made so far this turn, and returns either one more tool
//! call or the final answer. The concrete backend is swappable: the node
//! runs a model-driven planner, tests run a scripted one.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use thiserror::Error;

use super::tool::ToolSpec;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Missing API key for reasoning service")]
    MissingApiKey,

    #[error("Reasoning service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Planner output did not follow the decision protocol
    #[error("Malformed planner decision: {0}")]
    Protocol(String),

    #[error("Reasoning service unavailable after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },
}

/// One tool invocation made during the current turn
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool: String,
    pub input: String,
    pub output: String,
}

/// Planner output: call one more tool, or stop and answer
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerDecision {
    CallTool { tool: String, input: String },
    Finish { answer: String },
}

#[async_trait]
pub trait Planner: Send + Sync {
    async fn decide(
        &self,
        request: &str,
        context: &str,
        tools: &[ToolSpec],
        history: &[ToolInvocation],
    ) -> Result<PlannerDecision, PlannerError>;
}

/// Canned-decision planner for tests and offline runs.
///
/// Plays back a fixed sequence; once exhausted it either repeats the last
/// decision (to exercise the router's step ceiling) or fails.
pub struct ScriptedPlanner {
    steps: Mutex<VecDeque<PlannerDecision>>,
    repeat_last: Option<PlannerDecision>,
}

impl ScriptedPlanner {
    pub fn new(steps: Vec<PlannerDecision>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            repeat_last: None,
        }
    }

    /// Planner that returns the same decision forever
    pub fn repeating(decision: PlannerDecision) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            repeat_last: Some(decision),
        }
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn decide(
        &self,
        _request: &str,
        _context: &str,
        _tools: &[ToolSpec],
        _history: &[ToolInvocation],
    ) -> Result<PlannerDecision, PlannerError> {
        let next = self.steps.lock().expect("planner script lock").pop_front();
        match next.or_else(|| self.repeat_last.clone()) {
            Some(decision) => Ok(decision),
            None => Err(PlannerError::Protocol("script exhausted".to_string())),
        }
    }
}
