use ado_cli_auth::{resolve_token, token_prefix, CredentialStore, ACCOUNT};
use ado_cli_output::{OutputFormat, OutputRenderer};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Store a personal access token in the system keyring
    Login(LoginArgs),
    /// Remove the stored token
    Logout,
    /// Show whether a token is available
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    /// Personal access token (prompted for when omitted)
    #[arg(long)]
    pub pat: Option<String>,
}

pub fn handle(command: AuthCommand, store: &CredentialStore, renderer: &OutputRenderer) -> Result<()> {
    match command {
        AuthCommand::Login(args) => login(args, store),
        AuthCommand::Logout => logout(store),
        AuthCommand::Status => status(store, renderer),
    }
}

fn login(args: LoginArgs, store: &CredentialStore) -> Result<()> {
    let token = match args.pat {
        Some(token) if !token.trim().is_empty() => token.trim().to_owned(),
        _ => rpassword::prompt_password("Enter PAT: ")
            .context("Failed to read token from prompt")?
            .trim()
            .to_owned(),
    };
    if token.is_empty() {
        return Err(anyhow!("PAT cannot be empty"));
    }

    store.set_secret(ACCOUNT, &token)?;
    eprintln!("PAT stored successfully.");
    Ok(())
}

fn logout(store: &CredentialStore) -> Result<()> {
    store.delete_secret(ACCOUNT)?;
    eprintln!("PAT removed from keyring.");
    Ok(())
}

#[derive(Serialize)]
struct AuthStatus {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_prefix: Option<String>,
}

fn status(store: &CredentialStore, renderer: &OutputRenderer) -> Result<()> {
    let status = match resolve_token(store) {
        Some((token, source)) => AuthStatus {
            authenticated: true,
            source: Some(source.to_string()),
            token_prefix: Some(token_prefix(&token)),
        },
        None => AuthStatus {
            authenticated: false,
            source: None,
            token_prefix: None,
        },
    };

    match renderer.format() {
        OutputFormat::Json => renderer.render(&status),
        _ => {
            match (&status.token_prefix, &status.source) {
                (Some(prefix), Some(source)) => {
                    println!("Authenticated: yes (token: {prefix}, from {source})")
                }
                _ => {
                    println!("Authenticated: no");
                    println!("Run 'ado auth login' to authenticate.");
                }
            }
            Ok(())
        }
    }
}
