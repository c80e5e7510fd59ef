use url::Url;

use crate::error::{ApiError, Result};
use crate::transport::Target;

pub const DEFAULT_API_VERSION: &str = "7.1";

const CLOUD_HOST: &str = "https://dev.azure.com/";
const API_VERSION_PARAM: &str = "api-version";

/// Organization base address plus the API version stamped onto every request.
///
/// Org-level resources live under `{base}/_apis/`, project-scoped ones under
/// `{base}/{project}/_apis/`. The base always ends with a slash so that
/// `Url::join` appends instead of replacing the last segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    org_base: Url,
    api_version: String,
}

impl Endpoint {
    /// Accepts either a bare organization name (`contoso`) or a full
    /// collection URL (`https://tfs.example.com/DefaultCollection`).
    pub fn for_organization(organization: &str) -> Result<Self> {
        let trimmed = organization.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ApiError::InvalidOrganization(organization.to_string()));
        }

        let org_base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let mut url = Url::parse(trimmed)?;
            if url.query().is_some() || url.fragment().is_some() {
                return Err(ApiError::InvalidOrganization(organization.to_string()));
            }
            url.path_segments_mut()
                .map_err(|_| ApiError::InvalidOrganization(organization.to_string()))?
                .pop_if_empty()
                .push("");
            url
        } else if trimmed.contains('/') {
            return Err(ApiError::InvalidOrganization(organization.to_string()));
        } else {
            let mut url = Url::parse(CLOUD_HOST)?;
            url.path_segments_mut()
                .map_err(|_| ApiError::InvalidOrganization(organization.to_string()))?
                .pop_if_empty()
                .push(trimmed)
                .push("");
            url
        };

        Ok(Self {
            org_base,
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn org_base(&self) -> &Url {
        &self.org_base
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// `{base}/_apis/{path}`; `path` may carry its own query string.
    pub fn org_url(&self, path: &str) -> Result<Url> {
        let apis = self.org_base.join("_apis/")?;
        Ok(apis.join(path.trim_start_matches('/'))?)
    }

    /// `{base}/{project}/_apis/{path}` with the project encoded as one segment.
    pub fn project_url(&self, project: &str, path: &str) -> Result<Url> {
        if project.trim().is_empty() {
            return Err(ApiError::MissingInput { field: "project" });
        }

        let mut base = self.org_base.clone();
        base.path_segments_mut()
            .map_err(|_| ApiError::InvalidOrganization(self.org_base.to_string()))?
            .pop_if_empty()
            .push(project)
            .push("_apis")
            .push("");
        Ok(base.join(path.trim_start_matches('/'))?)
    }

    /// Final request URL: the target plus `api-version`, keeping every other
    /// query pair in its original order.
    pub fn resolve(&self, target: &Target) -> Result<Url> {
        let mut url = match target {
            Target::Org(path) => self.org_url(path)?,
            Target::Url(url) => url.clone(),
        };
        self.stamp_api_version(&mut url);
        Ok(url)
    }

    fn stamp_api_version(&self, url: &mut Url) {
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != API_VERSION_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair(API_VERSION_PARAM, &self.api_version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_of(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_bare_organization_uses_cloud_host() {
        let endpoint = Endpoint::for_organization("contoso").unwrap();
        assert_eq!(endpoint.org_base().as_str(), "https://dev.azure.com/contoso/");
        assert_eq!(endpoint.api_version(), "7.1");
    }

    #[test]
    fn test_full_url_organization() {
        let endpoint =
            Endpoint::for_organization("https://tfs.example.com/DefaultCollection/").unwrap();
        assert_eq!(
            endpoint.org_base().as_str(),
            "https://tfs.example.com/DefaultCollection/"
        );
    }

    #[test]
    fn test_invalid_organizations() {
        assert!(matches!(
            Endpoint::for_organization("  "),
            Err(ApiError::InvalidOrganization(_))
        ));
        assert!(matches!(
            Endpoint::for_organization("contoso/project"),
            Err(ApiError::InvalidOrganization(_))
        ));
    }

    #[test]
    fn test_organization_url_with_query_or_fragment_is_rejected() {
        for org in [
            "https://tfs.example.com/DefaultCollection?x=1",
            "https://tfs.example.com/DefaultCollection#top",
        ] {
            assert!(
                matches!(
                    Endpoint::for_organization(org),
                    Err(ApiError::InvalidOrganization(_))
                ),
                "{org} should be rejected"
            );
        }
    }

    #[test]
    fn test_organization_url_without_path_gets_trailing_slash() {
        let endpoint = Endpoint::for_organization("http://127.0.0.1:8080").unwrap();
        assert_eq!(endpoint.org_base().as_str(), "http://127.0.0.1:8080/");
        let url = endpoint.org_url("connectionData").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/_apis/connectionData");
    }

    #[test]
    fn test_org_url() {
        let endpoint = Endpoint::for_organization("contoso").unwrap();
        let url = endpoint.org_url("connectionData").unwrap();
        assert_eq!(url.as_str(), "https://dev.azure.com/contoso/_apis/connectionData");
    }

    #[test]
    fn test_project_url_encodes_project_segment() {
        let endpoint = Endpoint::for_organization("contoso").unwrap();
        let url = endpoint
            .project_url("Fabrikam Fiber", "git/repositories")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/contoso/Fabrikam%20Fiber/_apis/git/repositories"
        );
    }

    #[test]
    fn test_project_url_requires_project() {
        let endpoint = Endpoint::for_organization("contoso").unwrap();
        assert!(matches!(
            endpoint.project_url("", "git/repositories"),
            Err(ApiError::MissingInput { field: "project" })
        ));
    }

    #[test]
    fn test_resolve_appends_api_version() {
        let endpoint = Endpoint::for_organization("contoso").unwrap();
        let url = endpoint
            .resolve(&Target::Org("wit/workitems/7".to_string()))
            .unwrap();
        assert_eq!(
            query_of(&url),
            vec![("api-version".to_string(), "7.1".to_string())]
        );
    }

    #[test]
    fn test_resolve_preserves_existing_query() {
        let endpoint = Endpoint::for_organization("contoso").unwrap();
        let target = endpoint.project_url("Fabrikam", "wit/wiql?$top=20").unwrap();
        let url = endpoint.resolve(&Target::Url(target)).unwrap();
        assert_eq!(
            query_of(&url),
            vec![
                ("$top".to_string(), "20".to_string()),
                ("api-version".to_string(), "7.1".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_replaces_stale_api_version() {
        let endpoint = Endpoint::for_organization("contoso")
            .unwrap()
            .with_api_version("7.2-preview");
        let target = Url::parse("https://dev.azure.com/contoso/p/_apis/x?api-version=5.0&a=b")
            .unwrap();
        let url = endpoint.resolve(&Target::Url(target)).unwrap();
        assert_eq!(
            query_of(&url),
            vec![
                ("a".to_string(), "b".to_string()),
                ("api-version".to_string(), "7.2-preview".to_string()),
            ]
        );
    }
}
