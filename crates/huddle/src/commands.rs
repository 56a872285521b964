//! huddle command implementations

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::{error, info, warn};

use huddle_agent::{
    usable_tools, AgentLoop, ContextBuilder, DriverSettings, ProvisionReport, Provisioner,
    RunOutcome,
};
use huddle_config::{self, Config, ToolManifest};
use huddle_platform::{AgentPlatform, XpanderClient};
use huddle_provider::{OpenAiCompatProvider, Provider};
use huddle_session::ThreadStore;

/// Initialize config, example manifest and thread store
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing huddle...");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = huddle_config::init().await?;

    println!("Config:   {}", huddle_config::config_path().display());
    println!("Manifest: {}", config.manifest_path().display());
    println!("Threads:  {}", huddle_config::threads_dir().display());

    println!("\n◆ huddle initialized");
    println!("\nNext steps:");
    println!("  1. Set model.api_key and platform.api_key in ~/.huddle/config.json");
    println!("  2. Edit the tool list in {}", config.manifest_path().display());
    println!("  3. Create the agent: huddle provision");
    println!("  4. Run a task:       huddle run -m \"What is on my calendar today?\"");

    Ok(())
}

fn platform_client(config: &Config) -> Result<XpanderClient> {
    let api_key = config
        .platform_api_key()
        .context("No platform API key configured. Set platform.api_key in ~/.huddle/config.json")?;
    Ok(XpanderClient::new(
        api_key,
        Some(config.platform.api_base.clone()),
    ))
}

fn completion_provider(config: &Config) -> Result<OpenAiCompatProvider> {
    let api_key = config
        .model_api_key()
        .context("No model API key configured. Set model.api_key in ~/.huddle/config.json")?;
    Ok(OpenAiCompatProvider::new(
        api_key,
        Some(config.model.api_base.clone()),
        Some(config.model.model.clone()),
    ))
}

async fn load_manifest(config: &Config) -> Result<ToolManifest> {
    let path = config.manifest_path();
    ToolManifest::load_from(&path)
        .await
        .with_context(|| format!("Cannot read tool manifest {}. Run `huddle init` first", path.display()))
}

/// Ensure the agent exists with the manifest tools, remembering its id
async fn provision_agent<X: AgentPlatform + ?Sized>(
    config: &mut Config,
    platform: &X,
    manifest: &ToolManifest,
) -> Result<ProvisionReport> {
    let provisioner = Provisioner::new(platform);
    let agent = provisioner.ensure_agent(&manifest.agent_name).await?;
    let report = provisioner.provision(&agent, manifest).await?;

    if config.agent_id().as_deref() != Some(agent.id.as_str()) {
        config.platform.agent_id = Some(agent.id.clone());
        config.save().await?;
        info!("◆ AGENT ID {} SAVED TO CONFIG", agent.id);
    }

    Ok(report)
}

fn print_report(report: &ProvisionReport) {
    println!("Agent:    {}", report.agent_id);
    for id in &report.attached {
        println!("  + {}", id);
    }
    for id in &report.already_present {
        println!("  = {}", id);
    }
    for missing in &report.missing {
        println!("  ✗ {}", missing);
    }
    println!(
        "Attached {}, already present {}, missing {}",
        report.attached.len(),
        report.already_present.len(),
        report.missing.len()
    );
}

/// Create or reuse the remote agent and attach the manifest tools
pub async fn provision_command() -> Result<()> {
    let mut config = Config::load().await?;
    let manifest = load_manifest(&config).await?;
    let platform = platform_client(&config)?;

    println!("◆ Provisioning {}", manifest.agent_name);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let report = provision_agent(&mut config, &platform, &manifest).await?;
    print_report(&report);

    if report.is_complete() {
        println!("\n◆ Ready");
    } else {
        println!("\n◆ Provisioned with missing tools");
    }
    Ok(())
}

async fn run_once<P: Provider, X: AgentPlatform>(
    agent: &AgentLoop<P, X>,
    threads: &mut ThreadStore,
    session: &str,
    task: &str,
) -> Result<RunOutcome> {
    let thread_id = threads.thread_for(session, agent.agent_id()).await;
    let outcome = agent.run(task, thread_id.as_deref()).await?;
    threads
        .record(
            session,
            agent.agent_id(),
            &outcome.thread_id,
            &outcome.status.to_string(),
        )
        .await?;
    Ok(outcome)
}

fn print_outcome(outcome: &RunOutcome) {
    println!("\n◆ {}", outcome.result);
    info!(
        "◆ {} on thread {} after {} iteration(s), {} tokens",
        outcome.status, outcome.thread_id, outcome.iterations, outcome.usage.total_tokens
    );
}

/// Run a task, or read tasks from stdin when none is given
pub async fn run_command(
    message: Option<String>,
    session: String,
    fresh: bool,
    instructions: Option<String>,
) -> Result<()> {
    let mut config = Config::load().await?;
    let problems = config.problems();
    if !problems.is_empty() {
        bail!(
            "Configuration incomplete:\n  - {}",
            problems.join("\n  - ")
        );
    }

    let manifest = load_manifest(&config).await?;
    let platform = Arc::new(platform_client(&config)?);

    let agent_id = match config.agent_id() {
        Some(id) => id,
        None => {
            warn!("◆ NO AGENT RECORDED, PROVISIONING FIRST");
            let report = provision_agent(&mut config, platform.as_ref(), &manifest).await?;
            print_report(&report);
            report.agent_id
        }
    };

    let provider = Arc::new(completion_provider(&config)?);

    let remote = platform.get_agent(&agent_id).await?;
    let tools = usable_tools(&remote, &manifest);
    if tools.len() < manifest.tools.len() {
        warn!(
            "◆ {} OF {} MANIFEST TOOL(S) NOT ATTACHED, RUN `huddle provision`",
            manifest.tools.len() - tools.len(),
            manifest.tools.len()
        );
    }
    let mut context = ContextBuilder::new(manifest.agent_name.clone(), tools);
    if let Some(instructions) = instructions {
        context = context.with_instructions(instructions);
    }

    let agent = AgentLoop::new(
        provider,
        platform,
        agent_id,
        context,
        DriverSettings::from_config(&config),
    );

    let mut threads = ThreadStore::new(huddle_config::threads_dir());
    if fresh && threads.delete(&session).await? {
        info!("◆ STARTING A NEW THREAD FOR SESSION {}", session);
    }

    if let Some(task) = message {
        let outcome = run_once(&agent, &mut threads, &session, &task).await?;
        print_outcome(&outcome);
    } else {
        println!("◆ Interactive mode, session {} (type 'exit' to quit)", session);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        loop {
            print!("◆ ");
            std::io::stdout().flush()?;

            let mut input = String::new();
            if std::io::stdin().read_line(&mut input)? == 0 {
                break;
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            if input == "exit" || input == "quit" {
                break;
            }

            match run_once(&agent, &mut threads, &session, input).await {
                Ok(outcome) => {
                    print_outcome(&outcome);
                    println!();
                }
                Err(e) => error!("{:#}", e),
            }
        }
    }

    Ok(())
}

/// List remembered sessions
pub async fn threads_list_command() -> Result<()> {
    let store = ThreadStore::new(huddle_config::threads_dir());
    let records = store.list().await;

    if records.is_empty() {
        println!("No remembered threads");
        return Ok(());
    }

    println!("Remembered threads:");
    for record in records {
        println!(
            "  {} - {} (agent {}, {} run(s), {}, updated {})",
            record.key,
            record.thread_id,
            record.agent_id,
            record.runs,
            record.last_status.as_deref().unwrap_or("unknown"),
            record.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Forget a session so its next run starts a new thread
pub async fn threads_forget_command(session: String) -> Result<()> {
    let mut store = ThreadStore::new(huddle_config::threads_dir());
    if store.delete(&session).await? {
        println!("✓ Session {} forgotten", session);
    } else {
        println!("✗ Session {} not found", session);
    }
    Ok(())
}

fn presence(set: bool) -> &'static str {
    if set {
        "[Set]"
    } else {
        "[Missing]"
    }
}

/// Show status
pub async fn status_command() -> Result<()> {
    let config_path = huddle_config::config_path();

    println!("◆ huddle Status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!(
        "Config:     {} {}",
        config_path.display(),
        if config_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );

    let config = Config::load().await?;
    let manifest_path = config.manifest_path();
    println!(
        "Manifest:   {} {}",
        manifest_path.display(),
        if manifest_path.exists() {
            "[OK]"
        } else {
            "[Missing]"
        }
    );
    println!("Model:      {} @ {}", config.model.model, config.model.api_base);
    println!("Model key:  {}", presence(config.model_api_key().is_some()));
    println!("Platform:   {}", config.platform.api_base);
    println!(
        "Platform key: {}",
        presence(config.platform_api_key().is_some())
    );
    println!(
        "Agent:      {}",
        config
            .agent_id()
            .unwrap_or_else(|| "[Not provisioned]".to_string())
    );
    println!("Max iterations: {}", config.max_iterations());

    if manifest_path.exists() {
        match ToolManifest::load_from(&manifest_path).await {
            Ok(manifest) => println!(
                "Tools:      {} for {}",
                manifest.tools.len(),
                manifest.agent_name
            ),
            Err(e) => println!("Tools:      [Invalid] {}", e),
        }
    }

    let problems = config.problems();
    if problems.is_empty() {
        println!("\n◆ Ready");
    } else {
        println!("\n◆ Not ready:");
        for problem in problems {
            println!("  - {}", problem);
        }
    }

    Ok(())
}
