//! Shared test doubles for huddle-agent integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use mockall::mock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

use huddle_platform::{
    AgentPlatform, ExecutionResult, ExecutionStatus, PlatformError, RemoteAgent, RemoteInterface,
    RemoteOperation, TaskHandle, ToolInvocation, ToolResult, SENTINEL_TOOL,
};
use huddle_provider::{ChatParams, ChatResponse, Provider, ProviderError};

mock! {
    pub Provider {}

    #[async_trait]
    impl Provider for Provider {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError>;
        fn default_model(&self) -> String;
        fn is_configured(&self) -> bool;
    }
}

pub fn interface(id: &str, name: &str) -> RemoteInterface {
    RemoteInterface {
        id: id.to_string(),
        name: name.to_string(),
        raw: json!({}),
    }
}

pub fn operation(interface_id: &str, identifier: &str) -> RemoteOperation {
    RemoteOperation {
        internal_identifier: identifier.to_string(),
        name: identifier.to_string(),
        interface_id: interface_id.to_string(),
        raw: json!({}),
    }
}

/// In-memory platform that records every call it receives
#[derive(Default)]
pub struct FakePlatform {
    pub agents: Mutex<Vec<RemoteAgent>>,
    pub interfaces: Vec<RemoteInterface>,
    pub operations: HashMap<String, Vec<RemoteOperation>>,
    pub log: Mutex<Vec<String>>,
    pub executed: Mutex<Vec<ToolInvocation>>,
    pub task_threads: Mutex<Vec<Option<String>>>,
    pub final_result: Mutex<Option<String>>,
    pub fail_tools: bool,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform offering calendar, recorder and email interfaces
    pub fn with_catalog() -> Self {
        let mut operations = HashMap::new();
        operations.insert(
            "cal".to_string(),
            vec![
                operation("cal", "CalendarEventManagementGetCalendarEventsById"),
                operation("cal", "CalendarEventManagementCreateEvent"),
            ],
        );
        operations.insert(
            "rec".to_string(),
            vec![operation("rec", "MeetingRecordingBotCreateBot")],
        );
        operations.insert("mail".to_string(), vec![operation("mail", "SendEmail")]);

        Self {
            interfaces: vec![
                interface("cal", "Google Calendar"),
                interface("rec", "Meeting Recorder Bot"),
                interface("mail", "Email Service"),
            ],
            operations,
            ..Self::default()
        }
    }

    pub fn add_agent(&self, id: &str, name: &str, attached: &[&str]) {
        self.agents.lock().unwrap().push(RemoteAgent {
            id: id.to_string(),
            name: name.to_string(),
            attached: attached.iter().map(|s| s.to_string()).collect(),
        });
    }

    pub fn executed_names(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.name.clone())
            .collect()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }

    fn agent(&self, agent_id: &str) -> Result<RemoteAgent, PlatformError> {
        self.agents
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == agent_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(agent_id.to_string()))
    }
}

fn body_param<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload.get("bodyParams").and_then(|b| b.get(key))
}

#[async_trait]
impl AgentPlatform for FakePlatform {
    async fn list_agents(&self) -> Result<Vec<RemoteAgent>, PlatformError> {
        self.record("list_agents");
        Ok(self.agents.lock().unwrap().clone())
    }

    async fn create_agent(&self, name: &str) -> Result<RemoteAgent, PlatformError> {
        self.record(format!("create_agent {}", name));
        let mut agents = self.agents.lock().unwrap();
        let agent = RemoteAgent {
            id: format!("agent-{}", agents.len() + 1),
            name: name.to_string(),
            attached: Vec::new(),
        };
        agents.push(agent.clone());
        Ok(agent)
    }

    async fn get_agent(&self, agent_id: &str) -> Result<RemoteAgent, PlatformError> {
        self.record(format!("get_agent {}", agent_id));
        self.agent(agent_id)
    }

    async fn list_interfaces(&self, agent_id: &str) -> Result<Vec<RemoteInterface>, PlatformError> {
        self.record(format!("list_interfaces {}", agent_id));
        Ok(self.interfaces.clone())
    }

    async fn list_operations(
        &self,
        _agent_id: &str,
        interface: &RemoteInterface,
    ) -> Result<Vec<RemoteOperation>, PlatformError> {
        self.record(format!("list_operations {}", interface.id));
        Ok(self
            .operations
            .get(&interface.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn attach_operations(
        &self,
        agent_id: &str,
        operations: &[RemoteOperation],
    ) -> Result<(), PlatformError> {
        let ids: Vec<String> = operations
            .iter()
            .map(|op| op.internal_identifier.clone())
            .collect();
        self.record(format!("attach {}", ids.join(",")));
        let mut agents = self.agents.lock().unwrap();
        let agent = agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| PlatformError::NotFound(agent_id.to_string()))?;
        agent.attached.extend(ids);
        Ok(())
    }

    async fn sync_agent(&self, agent_id: &str) -> Result<(), PlatformError> {
        self.record(format!("sync {}", agent_id));
        Ok(())
    }

    async fn add_task(
        &self,
        agent_id: &str,
        input: &str,
        thread_id: Option<&str>,
    ) -> Result<TaskHandle, PlatformError> {
        self.record(format!("add_task {} {}", agent_id, input));
        self.task_threads
            .lock()
            .unwrap()
            .push(thread_id.map(|t| t.to_string()));
        Ok(TaskHandle {
            execution_id: "exec-1".to_string(),
            thread_id: thread_id.unwrap_or("thread-new").to_string(),
        })
    }

    async fn run_tools(
        &self,
        _agent_id: &str,
        execution_id: &str,
        invocations: &[ToolInvocation],
    ) -> Result<Vec<ToolResult>, PlatformError> {
        self.record(format!("run_tools {}", execution_id));
        if self.fail_tools {
            return Err(PlatformError::Api {
                status: 500,
                message: "tool backend down".to_string(),
            });
        }

        let mut results = Vec::new();
        for invocation in invocations {
            self.executed.lock().unwrap().push(invocation.clone());

            let (is_success, result) = if invocation.name == SENTINEL_TOOL {
                let answer = body_param(&invocation.payload, "result")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                *self.final_result.lock().unwrap() = Some(answer.clone());
                let ok = body_param(&invocation.payload, "is_success")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                (ok, json!(answer))
            } else {
                (true, json!(format!("{} done", invocation.name)))
            };

            results.push(ToolResult {
                function_name: invocation.name.clone(),
                status_code: 200,
                is_success,
                result,
                tool_call_id: Some(invocation.correlation_id.clone()),
            });
        }
        Ok(results)
    }

    async fn get_execution_result(
        &self,
        _agent_id: &str,
        execution_id: &str,
    ) -> Result<ExecutionResult, PlatformError> {
        self.record(format!("get_execution_result {}", execution_id));
        let thread_id = self
            .task_threads
            .lock()
            .unwrap()
            .last()
            .cloned()
            .flatten()
            .unwrap_or_else(|| "thread-new".to_string());
        let final_result = self.final_result.lock().unwrap().clone();
        Ok(ExecutionResult {
            status: if final_result.is_some() {
                ExecutionStatus::Completed
            } else {
                ExecutionStatus::InProgress
            },
            result: final_result.unwrap_or_default(),
            thread_id,
        })
    }
}
