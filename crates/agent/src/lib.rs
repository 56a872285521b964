//! Agent core
//!
//! Tool-call extraction, tool provisioning and the conversation loop that
//! drives a hosted agent.

use thiserror::Error;

pub mod context;
pub mod literal;
pub mod loop_agent;
pub mod provision;
pub mod tool_call;

pub use context::ContextBuilder;
pub use literal::{parse_literal, LiteralError};
pub use loop_agent::{AgentLoop, DriverSettings, RunOutcome};
pub use provision::{usable_tools, MissingReason, MissingTool, ProvisionReport, Provisioner};
pub use tool_call::{extract_tool_call, ParsedToolCall, ToolCallParse};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("◆ COMPLETION ERROR: {0}")]
    Provider(#[from] huddle_provider::ProviderError),

    #[error("◆ PLATFORM ERROR: {0}")]
    Platform(#[from] huddle_platform::PlatformError),

    #[error("◆ DID NOT CONVERGE AFTER {0} ITERATIONS")]
    DidNotConverge(u32),
}

pub type Result<T> = std::result::Result<T, AgentError>;
