//! `skillloop onboard` — First-time setup.

use skillloop_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("SkillLoop — First-Time Setup");
    println!("============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    // Load whatever is there so a customised skills.dir is honoured
    let config = AppConfig::load_from(&config_path).unwrap_or_default();

    let skills_dir = config.skills_dir();
    if !skills_dir.exists() {
        std::fs::create_dir_all(&skills_dir)?;
        println!("✅ Created skills directory: {}", skills_dir.display());
    } else {
        println!("  Skills directory exists: {}", skills_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Edit {} and add your API key", config_path.display());
        println!(
            "   2. Drop a skill into {}/<name>/SKILL.md",
            skills_dir.display()
        );
        println!("   3. Run: skillloop agent\n");
    }

    println!("🎉 Setup complete! Run `skillloop agent` to start chatting.\n");

    Ok(())
}
