//! # aura-replay
//!
//! Development host for the dispatch core: builds a window tree from a JSON
//! replay script, feeds it the scripted input on a manual clock and prints
//! where every event was delivered.

use anyhow::Result;
use aura_dispatch::replay::{ReplayRunner, ReplayScript};
use aura_dispatch::AuraConfig;
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aura-replay")]
#[command(about = "Replay scripted input against a headless root window")]
#[command(version)]
struct Cli {
    /// Replay script (JSON)
    script: PathBuf,

    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/aura/aura.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Only print the number of delivered events
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until the logger is up so a broken file is reported.
    let loaded = AuraConfig::load(&cli.config);
    let debug = cli.debug || loaded.as_ref().is_ok_and(|c| c.general.debug);

    if debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting aura-replay");
    info!("📄 Version: {}", aura_dispatch::VERSION);

    let config = match loaded {
        Ok(config) => {
            info!("✅ Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            if config_exists(&cli.config) {
                error!("❌ Failed to load configuration: {:#}", e);
            }
            info!("📝 Using default configuration");
            AuraConfig::default()
        }
    };

    let script = match ReplayScript::load(&cli.script) {
        Ok(script) => script,
        Err(e) => {
            error!("❌ {:#}", e);
            return Err(e);
        }
    };

    let mut runner = ReplayRunner::new(&config);
    let log = runner.run(&script)?;

    if cli.quiet {
        println!("{}", log.len());
    } else {
        for line in &log {
            println!("{}", line);
        }
    }

    info!("✨ Replay finished: {} deliveries, {} frames", log.len(), runner.draws());
    Ok(())
}

fn config_exists(path: &str) -> bool {
    AuraConfig::expand_path(path).map(|p| p.exists()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_existing_config_files_count_as_broken() {
        assert!(!config_exists("/nonexistent/aura/aura.toml"));
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(config_exists(file.path().to_str().unwrap()));
    }
}
