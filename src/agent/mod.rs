// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Tool routing: planner abstraction, tool registry, and the per-turn loop

pub mod openai;
pub mod planner;
pub mod router;
pub mod tool;

pub use openai::OpenAiPlanner;
pub use planner::{Planner, PlannerDecision, PlannerError, ScriptedPlanner, ToolInvocation};
pub use router::{AgentError, AgentOutcome, AgentRouter, RouterConfig};
pub use tool::{Tool, ToolError, ToolRegistry, ToolSpec};

/// Role context handed to the planner with every turn.
pub const ASSISTANT_CONTEXT: &str = "Purpose: The primary role of this agent is to assist users by \
providing accurate information about truck load transport concerns based on the indexed documents. \
If the documents don't provide enough information, still give concrete advice but indicate clearly \
that the information is not based on the documents. Give CONCRETE and CONCISE straightforward \
answers. No generic answers.";
