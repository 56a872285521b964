//! Common test utilities for huddle integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated home directory holding a `.huddle` data dir
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".huddle");
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { temp_dir, data_dir })
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// The huddle binary with HOME pointed at the test environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_huddle"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Write a config whose endpoints both point at `base_url`
    pub fn create_config(&self, base_url: &str, agent_id: Option<&str>) -> anyhow::Result<()> {
        let mut platform = json!({
            "api_key": "xp-test",
            "api_base": base_url,
        });
        if let Some(agent_id) = agent_id {
            platform["agent_id"] = json!(agent_id);
        }
        let config = json!({
            "model": {
                "api_key": "nim-test",
                "api_base": base_url,
                "model": "test/model"
            },
            "platform": platform,
            "driver": {
                "max_iterations": 5,
                "manifest": self.data_file("tools.json")
            }
        });
        std::fs::write(
            self.data_file("config.json"),
            serde_json::to_string_pretty(&config)?,
        )?;
        Ok(())
    }

    pub fn create_manifest(&self) -> anyhow::Result<()> {
        let manifest = json!({
            "agent_name": "Meeting Assistant",
            "tools": [
                {"interface": "calendar", "internal_name": "CalendarEventManagementGetCalendarEventsById"}
            ]
        });
        std::fs::write(
            self.data_file("tools.json"),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        Ok(())
    }

    pub fn read_json(&self, name: &str) -> anyhow::Result<Value> {
        Ok(serde_json::from_str(&std::fs::read_to_string(
            self.data_file(name),
        )?)?)
    }
}
