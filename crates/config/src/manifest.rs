//! Tool manifest: which remote operations the agent should carry

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::{ConfigError, Result};

/// One tool to attach, named by interface and operation identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Matched as a case-insensitive substring of the remote interface name
    #[serde(rename = "interface")]
    pub interface_name: String,
    /// Matched exactly against the remote operation identifier
    pub internal_name: String,
}

impl ToolSpec {
    pub fn new(interface_name: impl Into<String>, internal_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            internal_name: internal_name.into(),
        }
    }
}

/// Agent name plus its tool list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolManifest {
    pub agent_name: String,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
}

impl ToolManifest {
    /// Load and validate a manifest file
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        debug!("◆ READING MANIFEST FROM {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let manifest: ToolManifest = serde_json::from_str(&content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Reject manifests that could never provision anything sensible
    pub fn validate(&self) -> Result<()> {
        if self.agent_name.trim().is_empty() {
            return Err(ConfigError::Invalid("agent_name is empty".to_string()));
        }
        for (index, tool) in self.tools.iter().enumerate() {
            if tool.interface_name.trim().is_empty() || tool.internal_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "tools[{}] needs both interface and internal_name",
                    index
                )));
            }
        }
        Ok(())
    }

    /// Calendar, meeting recorder and email tools
    pub fn example() -> Self {
        Self {
            agent_name: "Meeting Assistant".to_string(),
            tools: vec![
                ToolSpec::new(
                    "google calendar",
                    "CalendarEventManagementGetCalendarEventsById",
                ),
                ToolSpec::new("meeting recorder", "MeetingRecordingBotCreateBot"),
                ToolSpec::new("email", "XpanderEmailServiceSendEmailWithHtmlOrTextContent"),
            ],
        }
    }
}
