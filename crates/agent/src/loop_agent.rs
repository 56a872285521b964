//! Agent loop - drives one task against the hosted agent

use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info, warn};

use huddle_config::Config;
use huddle_platform::{AgentPlatform, ExecutionStatus, ToolInvocation};
use huddle_provider::{ChatParams, Message, Provider, Usage};

use crate::context::ContextBuilder;
use crate::tool_call::{extract_tool_call, ToolCallParse};
use crate::{AgentError, Result};

/// Completion and iteration settings for the loop
#[derive(Debug, Clone)]
pub struct DriverSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_iterations: u32,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.0,
            max_tokens: 4096,
            max_iterations: 20,
        }
    }
}

impl DriverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model.model.clone(),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
            max_iterations: config.max_iterations(),
        }
    }
}

/// What a finished run hands back to the caller
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: String,
    /// Pass to the next run to continue the conversation
    pub thread_id: String,
    pub status: ExecutionStatus,
    pub iterations: u32,
    pub usage: Usage,
    /// Names of the tools executed, in order
    pub tool_calls: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Finished,
}

/// The agent loop: completion, extraction, remote execution, repeat until
/// the sentinel tool has run
pub struct AgentLoop<P: Provider, X: AgentPlatform> {
    provider: Arc<P>,
    platform: Arc<X>,
    agent_id: String,
    context: ContextBuilder,
    settings: DriverSettings,
}

impl<P: Provider, X: AgentPlatform> AgentLoop<P, X> {
    pub fn new(
        provider: Arc<P>,
        platform: Arc<X>,
        agent_id: impl Into<String>,
        context: ContextBuilder,
        settings: DriverSettings,
    ) -> Self {
        Self {
            provider,
            platform,
            agent_id: agent_id.into(),
            context,
            settings,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn max_iterations(&self) -> u32 {
        self.settings.max_iterations
    }

    /// Run `task` to completion, resuming `thread_id` when given
    pub async fn run(&self, task: &str, thread_id: Option<&str>) -> Result<RunOutcome> {
        let handle = self
            .platform
            .add_task(&self.agent_id, task, thread_id)
            .await?;
        info!(
            "◆ EXECUTION {} ON THREAD {}",
            handle.execution_id, handle.thread_id
        );

        let mut messages = self.context.build_messages(task, Local::now());
        let mut state = LoopState::Running;
        let mut iteration = 0;
        let mut usage = Usage::default();
        let mut tool_calls = Vec::new();

        while state == LoopState::Running {
            iteration += 1;
            if iteration > self.settings.max_iterations {
                return Err(AgentError::DidNotConverge(self.settings.max_iterations));
            }

            debug!("Agent iteration {}", iteration);

            let params = ChatParams {
                model: self.model(),
                messages: messages.clone(),
                max_tokens: self.settings.max_tokens,
                temperature: self.settings.temperature,
            };
            let response = self.provider.chat(params).await?;

            usage += response.usage;
            debug!(
                "Tokens: +{} prompt, +{} completion ({} total so far)",
                response.usage.prompt_tokens, response.usage.completion_tokens, usage.total_tokens
            );

            let content = response.text_or_empty().to_string();
            messages.push(Message::assistant(content.as_str()));

            let call = match extract_tool_call(&content) {
                ToolCallParse::Call(call) => call,
                other => {
                    if let ToolCallParse::Malformed { name, reason } = &other {
                        warn!("Malformed call to {}: {}", name, reason);
                    } else {
                        debug!("Reply carried no tool call");
                    }
                    ContextBuilder::add_retry_prompt(&mut messages, &other);
                    continue;
                }
            };

            debug!("Executing tool: {}", call.name);
            let invocation = ToolInvocation::new(call.name, call.payload);
            tool_calls.push(invocation.name.clone());

            let results = self
                .platform
                .run_tools(&self.agent_id, &handle.execution_id, &[invocation])
                .await?;

            for result in &results {
                ContextBuilder::add_tool_result(&mut messages, result);
                if result.is_sentinel() {
                    state = LoopState::Finished;
                }
            }
        }

        let execution = self
            .platform
            .get_execution_result(&self.agent_id, &handle.execution_id)
            .await?;
        info!(
            "◆ EXECUTION {} {} AFTER {} ITERATION(S)",
            handle.execution_id, execution.status, iteration
        );

        Ok(RunOutcome {
            result: execution.result,
            thread_id: execution.thread_id,
            status: execution.status,
            iterations: iteration,
            usage,
            tool_calls,
        })
    }

    fn model(&self) -> String {
        if self.settings.model.is_empty() {
            self.provider.default_model()
        } else {
            self.settings.model.clone()
        }
    }
}
