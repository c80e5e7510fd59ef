use std::time::Duration;

use ado_cli_api::{ApiClient, Endpoint};
use ado_cli_auth::{resolve_token, CredentialStore};
use ado_cli_config::Config;
use ado_cli_output::OutputRenderer;
use anyhow::{anyhow, Context, Result};

/// Everything a work item or pull request command needs.
pub struct AdoContext<'a> {
    pub client: ApiClient,
    pub project: Option<String>,
    pub renderer: &'a OutputRenderer,
}

impl<'a> AdoContext<'a> {
    /// Fails on missing organization, project (when `needs_project`) or token
    /// before any client is built.
    pub fn from_config(
        config: &Config,
        project_flag: Option<String>,
        needs_project: bool,
        timeout: Duration,
        store: &CredentialStore,
        renderer: &'a OutputRenderer,
    ) -> Result<Self> {
        let organization = config
            .organization
            .as_deref()
            .filter(|org| !org.trim().is_empty())
            .ok_or_else(|| {
                anyhow!("organization not configured (run 'ado config set organization <org>')")
            })?;
        let endpoint = Endpoint::for_organization(organization)?;

        let project = project_flag
            .filter(|p| !p.trim().is_empty())
            .or_else(|| config.project.clone())
            .filter(|p| !p.trim().is_empty());
        if needs_project && project.is_none() {
            return Err(missing_project());
        }

        let (token, source) = resolve_token(store).ok_or_else(|| {
            anyhow!("no personal access token found (set ADO_PAT or run 'ado auth login')")
        })?;
        tracing::debug!(%source, organization, "Building client");

        let client = ApiClient::new(endpoint)?
            .with_pat(token)
            .with_timeout(timeout)
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            project,
            renderer,
        })
    }

    pub fn project(&self) -> Result<&str> {
        self.project.as_deref().ok_or_else(missing_project)
    }
}

fn missing_project() -> anyhow::Error {
    anyhow!("project not specified (use --project or 'ado config set project <name>')")
}

/// `--top` for list commands; zero is rejected before any request.
pub fn validate_top(top: u32) -> Result<u32> {
    if top == 0 {
        return Err(anyhow!("--top must be at least 1"));
    }
    Ok(top)
}

/// Split a comma-separated flag value, dropping blanks.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Cut long titles for table cells.
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let kept: String = value.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ado_cli_output::OutputFormat;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("a, b,,c ")), vec!["a", "b", "c"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
    }

    #[test]
    fn test_validate_top() {
        assert!(validate_top(0).is_err());
        assert_eq!(validate_top(5).unwrap(), 5);
    }

    #[test]
    fn test_missing_organization_fails_first() {
        let renderer = OutputRenderer::new(OutputFormat::Table);
        let err = AdoContext::from_config(
            &Config::default(),
            None,
            true,
            Duration::from_secs(1),
            &CredentialStore::default(),
            &renderer,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("organization not configured"));
    }

    #[test]
    fn test_missing_project_fails_before_token_lookup() {
        let renderer = OutputRenderer::new(OutputFormat::Table);
        let config = Config {
            organization: Some("contoso".to_string()),
            ..Config::default()
        };
        let err = AdoContext::from_config(
            &config,
            Some("  ".to_string()),
            true,
            Duration::from_secs(1),
            &CredentialStore::new("adocli-test-no-such-service"),
            &renderer,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("project not specified"));
    }
}
