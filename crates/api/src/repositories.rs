use tracing::debug;

use crate::error::{ApiError, Result};
use crate::models::{Repository, ValueList};
use crate::transport::{send, Request, Target, Transport};

/// Something the service lists by display name and addresses by opaque id.
pub trait Named {
    /// Singular noun used in not-found errors.
    const KIND: &'static str;

    fn name(&self) -> &str;
    fn id(&self) -> &str;
}

impl Named for Repository {
    const KIND: &'static str = "repository";

    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Case-insensitive exact match; the first candidate in service order wins
/// when several share a name.
pub fn find_by_name<'c, T: Named>(candidates: &'c [T], name: &str) -> Option<&'c T> {
    let wanted = name.to_lowercase();
    candidates
        .iter()
        .find(|candidate| candidate.name().to_lowercase() == wanted)
}

pub struct Repositories<'a> {
    transport: &'a dyn Transport,
}

impl<'a> Repositories<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self, project: &str) -> Result<Vec<Repository>> {
        let url = self
            .transport
            .endpoint()
            .project_url(project, "git/repositories")?;
        let list: ValueList<Repository> = send(self.transport, Request::get(Target::Url(url))).await?;
        Ok(list.value)
    }

    /// Repository name to id. Always a fresh lookup.
    pub async fn resolve_id(&self, project: &str, name: &str) -> Result<String> {
        let repositories = self.list(project).await?;
        let found = find_by_name(&repositories, name).ok_or_else(|| ApiError::NotFound {
            kind: Repository::KIND,
            name: name.to_string(),
            scope: project.to_string(),
        })?;
        debug!(name, id = %found.id, "Resolved repository");
        Ok(found.id.clone())
    }
}
