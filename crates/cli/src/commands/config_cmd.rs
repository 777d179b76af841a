//! `prospector config` — configuration management.

use prospector_config::AppConfig;
use std::fs;

/// Print the resolved configuration, defaults filled in.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Write a default config.toml under the config directory.
pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");

    if path.exists() && !force {
        println!(
            "⚠️  {} already exists — pass --force to overwrite",
            path.display()
        );
        return Ok(());
    }

    fs::create_dir_all(&dir)?;
    fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Wrote {}", path.display());
    println!("   Edit it, then run `prospector doctor` to verify the setup.");
    Ok(())
}
