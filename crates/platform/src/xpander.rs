//! HTTP client for the xpander.ai agent platform

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::types::list_items;
use crate::*;

pub const XPANDER_API_BASE: &str = "https://inbound.xpander.ai";

/// Platform client holding one connection pool and the API key
pub struct XpanderClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl XpanderClient {
    pub fn new(api_key: impl Into<String>, api_base: Option<String>) -> Self {
        let api_base = api_base
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| XPANDER_API_BASE.to_string());

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        if self.api_key.is_empty() {
            return Err(PlatformError::NoApiKey);
        }

        let url = self.url(path);
        trace!("◆ PLATFORM {} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("x-api-key", &self.api_key);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| {
                    v["message"]
                        .as_str()
                        .or_else(|| v["detail"].as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or(text);
            if status.as_u16() == 404 {
                return Err(PlatformError::NotFound(message));
            }
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl AgentPlatform for XpanderClient {
    async fn list_agents(&self) -> Result<Vec<RemoteAgent>> {
        let json = self.request(Method::GET, "/agents", None).await?;
        list_items(&json, "agents")?
            .iter()
            .map(RemoteAgent::from_value)
            .collect()
    }

    async fn create_agent(&self, name: &str) -> Result<RemoteAgent> {
        let json = self
            .request(Method::POST, "/agents", Some(json!({ "name": name })))
            .await?;
        let agent = RemoteAgent::from_value(&json)?;
        debug!("◆ CREATED AGENT {} ({})", agent.name, agent.id);
        Ok(agent)
    }

    async fn get_agent(&self, agent_id: &str) -> Result<RemoteAgent> {
        let json = self
            .request(Method::GET, &format!("/agents/{}", agent_id), None)
            .await?;
        RemoteAgent::from_value(&json)
    }

    async fn list_interfaces(&self, agent_id: &str) -> Result<Vec<RemoteInterface>> {
        let json = self
            .request(Method::GET, &format!("/agents/{}/interfaces", agent_id), None)
            .await?;
        list_items(&json, "interfaces")?
            .iter()
            .map(RemoteInterface::from_value)
            .collect()
    }

    async fn list_operations(
        &self,
        agent_id: &str,
        interface: &RemoteInterface,
    ) -> Result<Vec<RemoteOperation>> {
        let path = format!("/agents/{}/interfaces/{}/operations", agent_id, interface.id);
        let json = self.request(Method::GET, &path, None).await?;
        list_items(&json, "operations")?
            .iter()
            .map(|v| RemoteOperation::from_value(v, &interface.id))
            .collect()
    }

    async fn attach_operations(
        &self,
        agent_id: &str,
        operations: &[RemoteOperation],
    ) -> Result<()> {
        let ids: Vec<&str> = operations
            .iter()
            .map(|op| op.internal_identifier.as_str())
            .collect();
        self.request(
            Method::POST,
            &format!("/agents/{}/operations", agent_id),
            Some(json!({ "operations": ids })),
        )
        .await?;
        Ok(())
    }

    async fn sync_agent(&self, agent_id: &str) -> Result<()> {
        self.request(Method::POST, &format!("/agents/{}/sync", agent_id), None)
            .await?;
        Ok(())
    }

    async fn add_task(
        &self,
        agent_id: &str,
        input: &str,
        thread_id: Option<&str>,
    ) -> Result<TaskHandle> {
        let mut body = json!({ "input": { "text": input } });
        if let Some(thread_id) = thread_id {
            body["memory_thread_id"] = json!(thread_id);
        }
        let json = self
            .request(
                Method::POST,
                &format!("/agents/{}/executions", agent_id),
                Some(body),
            )
            .await?;
        TaskHandle::from_value(&json)
    }

    async fn run_tools(
        &self,
        agent_id: &str,
        execution_id: &str,
        invocations: &[ToolInvocation],
    ) -> Result<Vec<ToolResult>> {
        let path = format!("/agents/{}/executions/{}/tools", agent_id, execution_id);
        let json = self
            .request(Method::POST, &path, Some(serde_json::to_value(invocations)?))
            .await?;
        list_items(&json, "results")?
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(PlatformError::from))
            .collect()
    }

    async fn get_execution_result(
        &self,
        agent_id: &str,
        execution_id: &str,
    ) -> Result<ExecutionResult> {
        let path = format!("/agents/{}/executions/{}", agent_id, execution_id);
        let json = self.request(Method::GET, &path, None).await?;
        ExecutionResult::from_value(&json)
    }
}
