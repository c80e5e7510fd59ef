//! Personal access token storage.
//!
//! Tokens are looked up in this order:
//! 1. `ADO_PAT` environment variable
//! 2. `AZURE_DEVOPS_EXT_PAT` environment variable (shared with the az extension)
//! 3. System keyring, written by `ado auth login`

use std::fmt;

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, info};

pub const SERVICE: &str = "adocli";
pub const ACCOUNT: &str = "pat";

pub const TOKEN_ENV_VARS: [&str; 2] = ["ADO_PAT", "AZURE_DEVOPS_EXT_PAT"];

/// Where the token in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment(&'static str),
    Keyring,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Environment(name) => write!(f, "environment variable {name}"),
            TokenSource::Keyring => write!(f, "system keyring"),
        }
    }
}

/// Thin wrapper over the platform keyring for one service name.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    service: String,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(SERVICE)
    }
}

impl CredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<Entry> {
        Entry::new(&self.service, account).context("Failed to create keyring entry")
    }

    /// `Ok(None)` when nothing is stored for the account.
    pub fn get_secret(&self, account: &str) -> Result<Option<String>> {
        match self.entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err).context("Failed to read token from keyring"),
        }
    }

    pub fn set_secret(&self, account: &str, secret: &str) -> Result<()> {
        self.entry(account)?
            .set_password(secret)
            .context("Failed to store token in keyring")?;
        info!(service = %self.service, account, "Token stored in system keyring");
        Ok(())
    }

    /// Deleting a missing entry is not an error.
    pub fn delete_secret(&self, account: &str) -> Result<()> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                info!(service = %self.service, account, "Token removed from system keyring");
                Ok(())
            }
            Err(err) => Err(err).context("Failed to delete token from keyring"),
        }
    }
}

/// First non-blank token from `env`, in [`TOKEN_ENV_VARS`] order.
pub fn token_from_env<F>(env: F) -> Option<(String, TokenSource)>
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN_ENV_VARS.iter().find_map(|name| {
        env(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| (value, TokenSource::Environment(*name)))
    })
}

/// Environment first, keyring second. Keyring failures are treated as
/// "no token" so that a locked or absent keyring does not mask the real
/// error the caller reports.
pub fn resolve_token(store: &CredentialStore) -> Option<(String, TokenSource)> {
    if let Some(found) = token_from_env(|name| std::env::var(name).ok()) {
        debug!(source = %found.1, "Using token from environment");
        return Some(found);
    }

    match store.get_secret(ACCOUNT) {
        Ok(Some(token)) if !token.trim().is_empty() => {
            debug!("Using token from system keyring");
            Some((token, TokenSource::Keyring))
        }
        Ok(_) => None,
        Err(err) => {
            debug!(error = %err, "Keyring lookup failed");
            None
        }
    }
}

/// First four characters followed by an ellipsis, for status output.
pub fn token_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}...")
}
