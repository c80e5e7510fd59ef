use std::path::Path;

use ado_cli_config::{Config, ConfigKey};
use ado_cli_output::{OutputFormat, OutputRenderer};
use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Set a configuration value (organization, project, output_format)
    Set {
        key: String,
        value: String,
    },
    /// Print one configuration value
    Get {
        key: String,
    },
    /// List all configuration values
    List,
}

/// Works on the file contents only; environment overrides are never saved.
pub fn handle(
    command: ConfigCommand,
    mut config: Config,
    config_path: Option<&Path>,
    renderer: &OutputRenderer,
) -> Result<()> {
    match command {
        ConfigCommand::Set { key, value } => {
            let key: ConfigKey = key.parse()?;
            config.set(key, &value)?;
            config
                .save(config_path)
                .context("Unable to persist configuration file")?;
            tracing::info!(%key, "Configuration updated");
            eprintln!("Set {key} = {}", config.get(key).unwrap_or(""));
            Ok(())
        }
        ConfigCommand::Get { key } => {
            let key: ConfigKey = key.parse()?;
            println!("{}", config.get(key).unwrap_or(""));
            Ok(())
        }
        ConfigCommand::List => list(&config, config_path, renderer),
    }
}

fn list(config: &Config, config_path: Option<&Path>, renderer: &OutputRenderer) -> Result<()> {
    if renderer.format() == OutputFormat::Json {
        return renderer.render(config);
    }

    #[derive(Serialize)]
    struct Row<'a> {
        key: &'a str,
        value: &'a str,
    }

    let rows: Vec<Row<'_>> = config
        .entries()
        .into_iter()
        .map(|(key, value)| Row {
            key: key.as_str(),
            value: value.unwrap_or(""),
        })
        .collect();
    renderer.render(&rows)?;

    if renderer.format() == OutputFormat::Table {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::default_path);
        println!("\nConfig file: {}", path.display());
    }
    Ok(())
}
