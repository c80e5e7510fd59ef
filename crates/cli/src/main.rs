mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use ado_cli_api::ApiError;
use ado_cli_auth::CredentialStore;
use ado_cli_config::Config;
use ado_cli_output::{OutputFormat, OutputRenderer};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use commands::auth::AuthCommand;
use commands::config::ConfigCommand;
use commands::pr::PrCommand;
use commands::utils::AdoContext;
use commands::workitem::WorkItemCommand;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ado", version, about = "Azure DevOps from the command line", long_about = None)]
struct Cli {
    /// Project to operate on (defaults to the configured project)
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Output format for command results
    #[arg(long, value_enum, global = true)]
    output: Option<OutputFormat>,

    /// Shorthand for --output json
    #[arg(long, global = true)]
    json: bool,

    /// Shorthand for --output plain
    #[arg(long, global = true)]
    plain: bool,

    /// Path to config file (defaults to ~/.config/ado/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Enable verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: AdoCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum AdoCommand {
    /// Authentication commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Read and change CLI configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Work item commands
    #[command(subcommand, visible_alias = "wi")]
    Workitem(WorkItemCommand),
    /// Pull request commands
    #[command(subcommand, visible_alias = "pullrequest")]
    Pr(PrCommand),
    /// Print version information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_tracing(cli.debug) {
        eprintln!("Warning: {err}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    let file_config = Config::load(config_path.as_ref())?;
    let config = file_config.clone().with_env_overrides();

    let format = OutputFormat::resolve(cli.json, cli.plain, cli.output, &config.output_format);
    let renderer = OutputRenderer::new(format);
    let store = CredentialStore::default();

    match cli.command {
        AdoCommand::Auth(command) => commands::auth::handle(command, &store, &renderer)?,
        AdoCommand::Config(command) => {
            commands::config::handle(command, file_config, config_path.as_deref(), &renderer)?
        }
        AdoCommand::Version => commands::version::show(&renderer)?,
        AdoCommand::Workitem(command) => {
            let ctx = AdoContext::from_config(
                &config,
                cli.project,
                command.needs_project(),
                Duration::from_secs(cli.timeout),
                &store,
                &renderer,
            )?;
            commands::workitem::execute(command, &ctx).await?
        }
        AdoCommand::Pr(command) => {
            let ctx = AdoContext::from_config(
                &config,
                cli.project,
                true,
                Duration::from_secs(cli.timeout),
                &store,
                &renderer,
            )?;
            commands::pr::execute(command, &ctx).await?
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug {
        "info,ado=debug,ado_cli_api=debug,ado_cli_auth=debug,ado_cli_config=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

fn report(err: &anyhow::Error) {
    eprintln!("Error: {err:#}");

    let hint = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
        .and_then(ApiError::suggestion);
    if let Some(hint) = hint {
        eprintln!("Hint: {hint}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ado", "wi", "list", "-p", "Fabrikam", "--json"]).unwrap();
        assert_eq!(cli.project.as_deref(), Some("Fabrikam"));
        assert!(cli.json);
        assert!(matches!(cli.command, AdoCommand::Workitem(_)));
    }

    #[test]
    fn test_pullrequest_alias() {
        let cli = Cli::try_parse_from(["ado", "pullrequest", "approve", "42"]).unwrap();
        assert!(matches!(cli.command, AdoCommand::Pr(_)));
    }

    #[test]
    fn test_only_project_scoped_workitem_commands_need_a_project() {
        let needs = |args: &[&str]| match Cli::try_parse_from(args).unwrap().command {
            AdoCommand::Workitem(command) => command.needs_project(),
            other => panic!("unexpected command {other:?}"),
        };
        assert!(needs(&["ado", "wi", "list"]));
        assert!(needs(&["ado", "wi", "create", "--type", "Bug", "--title", "x"]));
        assert!(!needs(&["ado", "wi", "show", "7"]));
        assert!(!needs(&["ado", "wi", "update", "7", "--state", "Closed"]));
    }

    #[test]
    fn test_timeout_default() {
        let cli = Cli::try_parse_from(["ado", "version"]).unwrap();
        assert_eq!(cli.timeout, 30);
        assert!(cli.output.is_none());
    }
}
