//! Typed records for platform payloads
//!
//! Payloads are read once at the boundary; callers never probe raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::{PlatformError, Result, SENTINEL_TOOL};

/// First string found under any of `keys`
fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Items of a list payload, accepting a bare array or a wrapper object
pub(crate) fn list_items(value: &Value, wrapper: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(map) => map
            .get(wrapper)
            .or_else(|| map.get("items"))
            .and_then(|v| v.as_array())
            .cloned()
            .ok_or_else(|| PlatformError::InvalidResponse(format!("expected list of {}", wrapper))),
        _ => Err(PlatformError::InvalidResponse(format!(
            "expected list of {}",
            wrapper
        ))),
    }
}

/// A platform agent record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAgent {
    pub id: String,
    pub name: String,
    /// Identifiers of the operations already attached
    pub attached: Vec<String>,
}

impl RemoteAgent {
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = string_field(value, &["id", "agent_id"])
            .ok_or_else(|| PlatformError::InvalidResponse("agent without id".to_string()))?;
        let name = string_field(value, &["name"]).unwrap_or_default();
        let attached = value
            .get("tools")
            .or_else(|| value.get("operations"))
            .and_then(|v| v.as_array())
            .map(|tools| {
                tools
                    .iter()
                    .filter_map(|t| match t {
                        Value::String(s) => Some(s.clone()),
                        other => string_field(other, RemoteOperation::ID_KEYS),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { id, name, attached })
    }

    pub fn has_operation(&self, internal_identifier: &str) -> bool {
        self.attached.iter().any(|id| id == internal_identifier)
    }
}

/// A group of operations backed by one external system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteInterface {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub raw: Value,
}

impl RemoteInterface {
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = string_field(value, &["id", "interface_id"])
            .ok_or_else(|| PlatformError::InvalidResponse("interface without id".to_string()))?;
        let name = string_field(value, &["name", "display_name"]).unwrap_or_default();
        Ok(Self {
            id,
            name,
            raw: value.clone(),
        })
    }

    /// Lookup key: the lower-cased display name
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Case-insensitive substring match against the display name
    pub fn matches(&self, needle: &str) -> bool {
        self.key().contains(&needle.to_lowercase())
    }
}

/// One callable action of an interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOperation {
    pub internal_identifier: String,
    pub name: String,
    pub interface_id: String,
    #[serde(default)]
    pub raw: Value,
}

impl RemoteOperation {
    const ID_KEYS: &'static [&'static str] =
        &["id_to_use_on_graph", "operation_id", "internal_identifier", "id"];

    pub fn from_value(value: &Value, interface_id: &str) -> Result<Self> {
        let internal_identifier = string_field(value, Self::ID_KEYS).ok_or_else(|| {
            PlatformError::InvalidResponse("operation without identifier".to_string())
        })?;
        let name = string_field(value, &["name", "summary"])
            .unwrap_or_else(|| internal_identifier.clone());
        Ok(Self {
            internal_identifier,
            name,
            interface_id: interface_id.to_string(),
            raw: value.clone(),
        })
    }
}

/// One tool call sent for remote execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub payload: Value,
    #[serde(rename = "tool_call_id")]
    pub correlation_id: String,
}

impl ToolInvocation {
    /// New invocation with a fresh correlation id
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            correlation_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Per-invocation outcome reported by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub function_name: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

impl ToolResult {
    pub fn is_sentinel(&self) -> bool {
        self.function_name == SENTINEL_TOOL
    }

    /// Result rendered for the transcript
    pub fn result_text(&self) -> String {
        match &self.result {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Execution state on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Completed,
    Failed,
    InProgress,
}

impl ExecutionStatus {
    pub fn parse(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "completed" | "complete" | "success" | "succeeded" | "finished" => Self::Completed,
            "failed" | "error" | "stopped" | "cancelled" => Self::Failed,
            _ => Self::InProgress,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::InProgress => "in progress",
        };
        f.write_str(s)
    }
}

/// Authoritative outcome of an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub result: String,
    pub thread_id: String,
}

impl ExecutionResult {
    pub fn from_value(value: &Value) -> Result<Self> {
        let status = value
            .get("status")
            .and_then(|s| s.as_str())
            .map(ExecutionStatus::parse)
            .unwrap_or(ExecutionStatus::InProgress);
        let result = match value.get("result") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let thread_id = string_field(value, &["memory_thread_id", "thread_id"]).ok_or_else(|| {
            PlatformError::InvalidResponse("execution without memory_thread_id".to_string())
        })?;
        Ok(Self {
            status,
            result,
            thread_id,
        })
    }
}

/// Handle to a freshly opened execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub execution_id: String,
    pub thread_id: String,
}

impl TaskHandle {
    pub fn from_value(value: &Value) -> Result<Self> {
        let execution_id = string_field(value, &["id", "execution_id"])
            .ok_or_else(|| PlatformError::InvalidResponse("execution without id".to_string()))?;
        let thread_id = string_field(value, &["memory_thread_id", "thread_id"]).ok_or_else(|| {
            PlatformError::InvalidResponse("execution without memory_thread_id".to_string())
        })?;
        Ok(Self {
            execution_id,
            thread_id,
        })
    }
}
