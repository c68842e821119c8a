//! `skillloop skills` — List the skills the agent can activate.

use skillloop_config::AppConfig;
use skillloop_core::skill::SkillStore;
use skillloop_tools::FsSkillStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let store = FsSkillStore::new(config.skills_dir());
    let names = store.list().await?;

    println!("Skills in {}:", store.root().display());
    if names.is_empty() {
        println!("  (none installed)");
        println!();
        println!("  Add one as <skills dir>/<name>/SKILL.md");
        return Ok(());
    }

    for name in &names {
        println!("  - {name}");
    }
    println!();
    println!("  {} skill(s) available", names.len());

    Ok(())
}
