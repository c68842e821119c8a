//! Built-in tool implementations for SkillLoop.
//!
//! Tools give the agent the ability to interact with the world:
//! run shell commands, read/write/edit files, switch skills on and off,
//! and keep a long-term memory file.

pub mod file_edit;
pub mod file_read;
pub mod file_write;
pub mod manage_memory;
pub mod manage_skill;
pub mod sandbox;
pub mod shell;
pub mod skill_store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use skillloop_config::AppConfig;
use skillloop_core::skill::SkillStore;
use skillloop_core::tool::ToolRegistry;
use tracing::{debug, warn};

pub use skill_store::FsSkillStore;

/// Create a tool registry with all built-in tools.
///
/// Relative file paths resolve against `base_dir`. The skill tool is
/// registered under `skills.management_tool` so the reconciler and the
/// registry agree on its name.
pub async fn default_registry(
    config: &AppConfig,
    store: Arc<dyn SkillStore>,
    base_dir: impl Into<PathBuf>,
) -> ToolRegistry {
    let base_dir = base_dir.into();
    let tools = &config.tools;
    let mut registry = ToolRegistry::new();

    registry.register(Box::new(
        shell::ShellTool::new(tools.allowed_commands.clone())
            .with_timeout(Duration::from_secs(tools.shell_timeout_secs))
            .with_output_limit(tools.shell_output_limit),
    ));
    registry.register(Box::new(
        file_read::FileReadTool::new(&base_dir)
            .with_forbidden_paths(tools.forbidden_paths.clone())
            .with_window(tools.read_file_window),
    ));
    registry.register(Box::new(
        file_write::FileWriteTool::new(&base_dir)
            .with_forbidden_paths(tools.forbidden_paths.clone())
            .with_partitions(&tools.data_dir, &tools.scratch_dir),
    ));
    registry.register(Box::new(
        file_edit::ReplaceInFileTool::new(&base_dir)
            .with_forbidden_paths(tools.forbidden_paths.clone()),
    ));

    let catalog = match store.list().await {
        Ok(names) => names,
        Err(e) => {
            warn!(error = %e, "Could not list skills");
            Vec::new()
        }
    };
    debug!(skills = catalog.len(), "Skill catalog loaded");
    registry.register(Box::new(
        manage_skill::ManageSkillTool::new(store)
            .with_name(&config.skills.management_tool)
            .with_catalog(catalog),
    ));

    registry.register(Box::new(manage_memory::ManageMemoryTool::new(
        config.memory_file(),
    )));

    registry
}
