//! Remote agent and tool provisioning
//!
//! Best effort: a tool whose interface or operation cannot be found is
//! reported and skipped, never fatal.

use std::fmt;
use tracing::{debug, info, warn};

use huddle_config::{ToolManifest, ToolSpec};
use huddle_platform::{AgentPlatform, RemoteAgent, RemoteOperation};

/// Why a configured tool was not attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingReason {
    NoInterface,
    NoOperation { interface: String },
}

/// A configured tool that could not be provisioned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTool {
    pub spec: ToolSpec,
    pub reason: MissingReason,
}

impl fmt::Display for MissingTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MissingReason::NoInterface => write!(
                f,
                "{}: no interface matching '{}'",
                self.spec.internal_name, self.spec.interface_name
            ),
            MissingReason::NoOperation { interface } => write!(
                f,
                "{}: not offered by interface '{}'",
                self.spec.internal_name, interface
            ),
        }
    }
}

/// What a provisioning pass did
#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    pub agent_id: String,
    pub attached: Vec<String>,
    pub already_present: Vec<String>,
    pub missing: Vec<MissingTool>,
}

impl ProvisionReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Manifest tools the agent actually carries, in manifest order
pub fn usable_tools(agent: &RemoteAgent, manifest: &ToolManifest) -> Vec<String> {
    let mut tools: Vec<String> = Vec::new();
    for spec in &manifest.tools {
        if agent.has_operation(&spec.internal_name) && !tools.contains(&spec.internal_name) {
            tools.push(spec.internal_name.clone());
        }
    }
    tools
}

/// Attaches manifest tools to a remote agent
pub struct Provisioner<'a, X: AgentPlatform + ?Sized> {
    platform: &'a X,
}

impl<'a, X: AgentPlatform + ?Sized> Provisioner<'a, X> {
    pub fn new(platform: &'a X) -> Self {
        Self { platform }
    }

    /// Reuse the agent named `name`, creating it when absent
    pub async fn ensure_agent(&self, name: &str) -> huddle_platform::Result<RemoteAgent> {
        let agents = self.platform.list_agents().await?;
        if let Some(agent) = agents.into_iter().find(|a| a.name == name) {
            debug!("◆ REUSING AGENT {} ({})", agent.name, agent.id);
            return self.platform.get_agent(&agent.id).await;
        }

        info!("◆ CREATING AGENT {}", name);
        self.platform.create_agent(name).await
    }

    /// Attach every manifest tool the agent does not carry yet
    pub async fn provision(
        &self,
        agent: &RemoteAgent,
        manifest: &ToolManifest,
    ) -> huddle_platform::Result<ProvisionReport> {
        let mut report = ProvisionReport {
            agent_id: agent.id.clone(),
            ..Default::default()
        };

        let interfaces = self.platform.list_interfaces(&agent.id).await?;
        let mut to_attach: Vec<RemoteOperation> = Vec::new();

        for spec in &manifest.tools {
            let Some(interface) = interfaces.iter().find(|i| i.matches(&spec.interface_name))
            else {
                warn!(
                    "◆ NO INTERFACE MATCHING '{}' FOR {}",
                    spec.interface_name, spec.internal_name
                );
                report.missing.push(MissingTool {
                    spec: spec.clone(),
                    reason: MissingReason::NoInterface,
                });
                continue;
            };

            let operations = self.platform.list_operations(&agent.id, interface).await?;
            let Some(operation) = operations
                .into_iter()
                .find(|op| op.internal_identifier == spec.internal_name)
            else {
                warn!(
                    "◆ INTERFACE '{}' HAS NO OPERATION {}",
                    interface.name, spec.internal_name
                );
                report.missing.push(MissingTool {
                    spec: spec.clone(),
                    reason: MissingReason::NoOperation {
                        interface: interface.name.clone(),
                    },
                });
                continue;
            };

            let pending = to_attach
                .iter()
                .any(|op| op.internal_identifier == operation.internal_identifier);
            if agent.has_operation(&operation.internal_identifier) || pending {
                debug!("◆ {} ALREADY ATTACHED", operation.internal_identifier);
                report
                    .already_present
                    .push(operation.internal_identifier.clone());
            } else {
                report.attached.push(operation.internal_identifier.clone());
                to_attach.push(operation);
            }
        }

        if !to_attach.is_empty() {
            self.platform
                .attach_operations(&agent.id, &to_attach)
                .await?;
            self.platform.sync_agent(&agent.id).await?;
            info!(
                "◆ ATTACHED {} TOOL(S) TO {}",
                to_attach.len(),
                agent.id
            );
        }

        Ok(report)
    }
}
