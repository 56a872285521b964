//! Context builder for assembling the conversation seed

use chrono::{DateTime, Local};

use huddle_platform::{ToolResult, SENTINEL_TOOL};
use huddle_provider::Message;

use crate::tool_call::ToolCallParse;

/// Builds the system prompt and the per-turn feedback messages
pub struct ContextBuilder {
    agent_name: String,
    instructions: Option<String>,
    tools: Vec<String>,
}

impl ContextBuilder {
    pub fn new(agent_name: impl Into<String>, tools: Vec<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            instructions: None,
            tools,
        }
    }

    /// Operator instructions appended to the protocol rules
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Build the system prompt
    pub fn build_system_prompt(&self) -> String {
        let mut parts = vec![self.identity(), self.protocol()];
        if let Some(instructions) = &self.instructions {
            parts.push(format!("## Instructions\n\n{}", instructions));
        }
        parts.join("\n\n---\n\n")
    }

    fn identity(&self) -> String {
        format!(
            "# {}\n\nYou are {}, an assistant that manages calendars, meeting recordings and email by calling tools.",
            self.agent_name, self.agent_name
        )
    }

    fn protocol(&self) -> String {
        let tools = if self.tools.is_empty() {
            "(no tools attached)".to_string()
        } else {
            self.tools
                .iter()
                .map(|t| format!("- {}", t))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            r#"## Tool calls

Call exactly one tool per reply, written as
<TOOLCALL>[ToolName{{'pathParams': {{...}}, 'queryParams': {{...}}, 'bodyParams': {{...}}}}]</TOOLCALL>

Available tools:
{}
- {}

When the task is complete, call {} with bodyParams `result` (your final answer) and `is_success`."#,
            tools, SENTINEL_TOOL, SENTINEL_TOOL
        )
    }

    /// The injected timestamp message
    pub fn timestamp_message(now: DateTime<Local>) -> Message {
        Message::system(format!(
            "Current date and time: {}",
            now.format("%Y-%m-%d %H:%M:%S %Z (%A)")
        ))
    }

    /// System prompt, timestamp and task, in that order
    pub fn build_messages(&self, task: &str, now: DateTime<Local>) -> Vec<Message> {
        vec![
            Message::system(self.build_system_prompt()),
            Self::timestamp_message(now),
            Message::user(task),
        ]
    }

    /// Feed a remote tool result back into the transcript
    pub fn add_tool_result(messages: &mut Vec<Message>, result: &ToolResult) {
        messages.push(Message::user(format!(
            "Tool {} returned (status {}): {}",
            result.function_name,
            result.status_code,
            result.result_text()
        )));
    }

    /// Corrective turn for a reply that produced no usable call
    pub fn add_retry_prompt(messages: &mut Vec<Message>, parse: &ToolCallParse) {
        let detail = match parse {
            ToolCallParse::Malformed { name, reason } => {
                format!("Your call to {} could not be parsed: {}.", name, reason)
            }
            _ => "Your reply did not contain a tool call.".to_string(),
        };
        messages.push(Message::user(format!(
            "{} Reply with exactly one tool call in the [ToolName{{...}}] format, or call {} if you are done.",
            detail, SENTINEL_TOOL
        )));
    }
}
