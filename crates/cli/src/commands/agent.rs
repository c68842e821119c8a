//! `skillloop agent` — Interactive or single-message chat mode.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use skillloop_agent::{PromptAssembler, TurnController};
use skillloop_config::AppConfig;
use skillloop_core::error::ProviderError;
use skillloop_core::event::{DomainEvent, EventBus};
use skillloop_core::session::SessionState;
use skillloop_tools::FsSkillStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::archive;

const EXIT_WORDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Fail early with setup instructions when no key is configured
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    SKILLLOOP_API_KEY=sk-...   (preferred)");
        eprintln!("    OPENAI_API_KEY=sk-...      (OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = skillloop_providers::build_from_config(&config);
    let provider = router
        .default_provider()
        .ok_or_else(|| ProviderError::NotConfigured(config.default_provider.clone()))?;

    let cwd = std::env::current_dir()?;
    let store = Arc::new(FsSkillStore::new(config.skills_dir()));
    let tools = Arc::new(skillloop_tools::default_registry(&config, store, cwd.clone()).await);
    let tool_names = tools.names().join(", ");

    let assembler = match &config.agent.system_prompt_override {
        Some(instructions) => PromptAssembler::with_instructions(instructions.clone()),
        None => PromptAssembler::new(&cwd),
    };

    let event_bus = Arc::new(EventBus::default());
    let mut controller = TurnController::new(provider, &config.default_model, tools, assembler)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_tool_timeout(Duration::from_secs(config.agent.tool_timeout_secs))
        .with_management_tool(config.skills.management_tool.clone())
        .with_event_bus(event_bus.clone());
    if config.agent.max_iterations > 0 {
        controller = controller.with_max_iterations(config.agent.max_iterations);
    }

    let mut state = SessionState::new();

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let response = controller.submit(&mut state, &msg).await?;
        eprint!("\r              \r");
        println!("{response}");
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        SkillLoop Agent — Interactive Mode      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Tools:     {tool_names}");
    println!("  Skills:    {}", config.skills_dir().display());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let echo = tokio::spawn(echo_events(event_bus));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
            break;
        }

        match controller.submit(&mut state, input).await {
            Ok(response) => {
                println!();
                for line in response.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        let active = state.skills.names();
        if !active.is_empty() {
            println!("  Active skills: {}", active.join(", "));
            println!();
        }
    }

    echo.abort();

    if config.memory.archive_sessions {
        match archive::archive_once(&config.archive_dir(), &state.log) {
            Ok(Some(path)) => println!("  Session saved to {}", path.display()),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to archive session"),
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

/// Print tool calls and skill changes as the controller publishes them.
async fn echo_events(event_bus: Arc<EventBus>) {
    let mut rx = event_bus.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => match event.as_ref() {
                DomainEvent::ToolExecuted {
                    tool_name,
                    success,
                    duration_ms,
                    ..
                } => {
                    let mark = if *success { "✓" } else { "✗" };
                    eprintln!("  [tool] {tool_name} {mark} ({duration_ms} ms)");
                }
                DomainEvent::SkillActivated { name, .. } => {
                    eprintln!("  [skill] activated: {name}");
                }
                DomainEvent::SkillDeactivated { name, .. } => {
                    eprintln!("  [skill] deactivated: {name}");
                }
                _ => {}
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event echo fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
