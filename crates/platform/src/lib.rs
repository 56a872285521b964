//! Hosted agent platform
//!
//! The platform owns the agent record, its attached operations, execution
//! state and memory threads. This crate only speaks its request/response
//! contract.

use async_trait::async_trait;
use thiserror::Error;

pub mod types;
pub mod xpander;

pub use types::{
    ExecutionResult, ExecutionStatus, RemoteAgent, RemoteInterface, RemoteOperation, TaskHandle,
    ToolInvocation, ToolResult,
};
pub use xpander::XpanderClient;

/// Reserved operation name meaning "final answer ready, stop the loop"
pub const SENTINEL_TOOL: &str = "xpfinish-agent-execution-finished";

/// Platform errors
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("PLATFORM UNREACHABLE: {0}")]
    Request(#[from] reqwest::Error),

    #[error("BAD PAYLOAD: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PLATFORM REJECTED ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("NO PLATFORM API KEY")]
    NoApiKey,

    #[error("UNEXPECTED RESPONSE: {0}")]
    InvalidResponse(String),

    #[error("NOT FOUND: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Request/response contract of the hosted agent platform
#[async_trait]
pub trait AgentPlatform: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<RemoteAgent>>;

    async fn create_agent(&self, name: &str) -> Result<RemoteAgent>;

    async fn get_agent(&self, agent_id: &str) -> Result<RemoteAgent>;

    async fn list_interfaces(&self, agent_id: &str) -> Result<Vec<RemoteInterface>>;

    async fn list_operations(
        &self,
        agent_id: &str,
        interface: &RemoteInterface,
    ) -> Result<Vec<RemoteOperation>>;

    async fn attach_operations(&self, agent_id: &str, operations: &[RemoteOperation])
        -> Result<()>;

    /// Rebuild the agent's execution graph after tool changes
    async fn sync_agent(&self, agent_id: &str) -> Result<()>;

    /// Open an execution, resuming `thread_id` when given
    async fn add_task(
        &self,
        agent_id: &str,
        input: &str,
        thread_id: Option<&str>,
    ) -> Result<TaskHandle>;

    async fn run_tools(
        &self,
        agent_id: &str,
        execution_id: &str,
        invocations: &[ToolInvocation],
    ) -> Result<Vec<ToolResult>>;

    async fn get_execution_result(
        &self,
        agent_id: &str,
        execution_id: &str,
    ) -> Result<ExecutionResult>;
}
