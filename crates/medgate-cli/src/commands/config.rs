//! Configuration management commands.

use anyhow::{Context, Result};
use medgate_config::{ConfigLoader, MedgateConfig, Paths};
use std::path::Path;

use crate::style::{info_table, print_error, print_success};

fn load(project: &Path) -> Result<MedgateConfig> {
    ConfigLoader::new()
        .with_project_dir(project)
        .load()
        .context("Failed to load configuration")
}

/// Show current configuration.
pub fn show(project: &Path, format: &str) -> Result<()> {
    let config = load(project)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&config)?),
        "toml" => print!("{}", config.to_toml_string()?),
        _ => {
            let user_file = Paths::new()
                .user_config_file()
                .map_or_else(|_| "-".to_string(), |p| p.display().to_string());
            let entries = [
                ("engine.max_attributes", config.engine.max_attributes.to_string()),
                ("engine.cache_capacity", config.engine.cache_capacity.to_string()),
                (
                    "engine.max_policy_bytes",
                    config.engine.max_policy_bytes.to_string(),
                ),
                ("audit.enabled", config.audit.enabled.to_string()),
                (
                    "project file",
                    Paths::project_config_file(project).display().to_string(),
                ),
                ("user file", user_file),
            ];
            println!("{}", info_table(&entries));
        }
    }

    Ok(())
}

/// Validate configuration files.
pub fn validate(project: &Path) -> Result<()> {
    match load(project) {
        Ok(_) => {
            print_success("Configuration is valid");
            Ok(())
        }
        Err(e) => {
            print_error(&format!("{e:#}"));
            Err(e)
        }
    }
}
