use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::identity::Identities;
use crate::models::{ensure_ref, PullRequest, ValueList, Vote};
use crate::repositories::Repositories;
use crate::transport::{send, Request, Target, Transport};

/// Filters for listing pull requests. `creator` and `reviewer` accept `@me`.
#[derive(Clone, Debug, Default)]
pub struct PullRequestQuery {
    pub repository: Option<String>,
    pub status: Option<String>,
    pub creator: Option<String>,
    pub reviewer: Option<String>,
    pub top: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct CreatePullRequest {
    pub repository: String,
    pub title: String,
    pub source: String,
    pub target: String,
    pub description: Option<String>,
    pub reviewers: Vec<String>,
    pub is_draft: bool,
}

impl CreatePullRequest {
    fn validate(&self) -> Result<()> {
        let required = [
            ("--repo", &self.repository),
            ("--title", &self.title),
            ("--source", &self.source),
            ("--target", &self.target),
        ];
        match required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(ApiError::MissingInput { field }),
            None => Ok(()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPullRequest<'a> {
    source_ref_name: String,
    target_ref_name: String,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_draft: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    reviewers: Vec<ReviewerId>,
}

#[derive(Serialize)]
struct ReviewerId {
    id: String,
}

/// What a successful vote changed.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub pull_request_id: i64,
    pub repository: String,
    pub reviewer_id: String,
    pub vote: i32,
    pub status: &'static str,
}

pub struct PullRequests<'a> {
    transport: &'a dyn Transport,
}

impl<'a> PullRequests<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self, project: &str, query: &PullRequestQuery) -> Result<Vec<PullRequest>> {
        let path = match query.repository.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => {
                let id = Repositories::new(self.transport)
                    .resolve_id(project, name)
                    .await?;
                format!("git/repositories/{id}/pullrequests")
            }
            None => "git/pullrequests".to_string(),
        };

        let identities = Identities::new(self.transport);
        let creator = match query.creator.as_deref().filter(|v| !v.is_empty()) {
            Some(value) => Some(identities.resolve_id(value).await?),
            None => None,
        };
        let reviewer = match query.reviewer.as_deref().filter(|v| !v.is_empty()) {
            Some(value) => Some(identities.resolve_id(value).await?),
            None => None,
        };

        let mut url = self.transport.endpoint().project_url(project, &path)?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
                pairs.append_pair("searchCriteria.status", status);
            }
            if let Some(creator) = &creator {
                pairs.append_pair("searchCriteria.creatorId", creator);
            }
            if let Some(reviewer) = &reviewer {
                pairs.append_pair("searchCriteria.reviewerId", reviewer);
            }
            if let Some(top) = query.top {
                pairs.append_pair("$top", &top.to_string());
            }
        }
        debug!(%url, "Listing pull requests");

        let list: ValueList<PullRequest> = send(self.transport, Request::get(Target::Url(url))).await?;
        Ok(list.value)
    }

    pub async fn get(&self, project: &str, id: i64) -> Result<PullRequest> {
        let url = self
            .transport
            .endpoint()
            .project_url(project, &format!("git/pullrequests/{id}"))?;
        send(self.transport, Request::get(Target::Url(url))).await
    }

    pub async fn create(&self, project: &str, input: &CreatePullRequest) -> Result<PullRequest> {
        input.validate()?;

        let repository_id = Repositories::new(self.transport)
            .resolve_id(project, &input.repository)
            .await?;

        let identities = Identities::new(self.transport);
        let mut reviewers = Vec::with_capacity(input.reviewers.len());
        for reviewer in input.reviewers.iter().filter(|r| !r.is_empty()) {
            reviewers.push(ReviewerId {
                id: identities.resolve_id(reviewer).await?,
            });
        }

        let body = NewPullRequest {
            source_ref_name: ensure_ref(&input.source),
            target_ref_name: ensure_ref(&input.target),
            title: &input.title,
            description: input.description.as_deref().filter(|d| !d.is_empty()),
            is_draft: input.is_draft,
            reviewers,
        };

        let url = self.transport.endpoint().project_url(
            project,
            &format!("git/repositories/{repository_id}/pullrequests"),
        )?;
        let created: PullRequest =
            send(self.transport, Request::new(Method::POST, Target::Url(url)).with_json(&body)?).await?;

        info!(
            id = created.pull_request_id,
            repository = %input.repository,
            "Pull request created"
        );
        Ok(created)
    }

    /// Cast the caller's vote: read the pull request for its repository, look
    /// up the caller, then record the vote. Stops at the first failure.
    pub async fn vote(&self, project: &str, id: i64, vote: Vote) -> Result<VoteOutcome> {
        let pull_request = self.get(project, id).await?;
        let repository = pull_request.repository.id;

        let me = Identities::new(self.transport).me().await?;

        let url = self.transport.endpoint().project_url(
            project,
            &format!("git/repositories/{repository}/pullrequests/{id}/reviewers/{}", me.id),
        )?;
        let request =
            Request::new(Method::PUT, Target::Url(url)).with_json(&json!({ "vote": vote.value() }))?;
        // The reviewer record in the reply is not needed.
        self.transport.execute(request).await?;

        info!(id, vote = vote.value(), reviewer = %me.id, "Vote recorded");
        Ok(VoteOutcome {
            pull_request_id: id,
            repository,
            reviewer_id: me.id,
            vote: vote.value(),
            status: vote.label(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubTransport;
    use serde_json::json;

    fn pull_request(id: i64, repository: &str) -> serde_json::Value {
        json!({
            "pullRequestId": id,
            "title": "Add retry budget",
            "status": "active",
            "createdBy": {"id": "U1", "displayName": "Mateo Escobedo"},
            "creationDate": "2024-03-01T10:00:00Z",
            "sourceRefName": "refs/heads/feature/retry",
            "targetRefName": "refs/heads/main",
            "repository": {"id": repository, "name": "api"},
            "reviewers": []
        })
    }

    fn me() -> serde_json::Value {
        json!({"authenticatedUser": {"id": "U9", "displayName": "Jamal Hartnett"}})
    }

    #[tokio::test]
    async fn test_vote_runs_three_calls_in_order() {
        let stub = StubTransport::new()
            .respond_json(200, pull_request(42, "R1"))
            .respond_json(200, me())
            .respond_json(200, json!({"id": "U9", "vote": 10}));

        let outcome = PullRequests::new(&stub)
            .vote("Fabrikam", 42, Vote::Approve)
            .await
            .unwrap();
        assert_eq!(outcome.vote, 10);
        assert_eq!(outcome.status, "Approved");
        assert_eq!(outcome.repository, "R1");

        let calls = stub.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            stub.url_of(0),
            "https://dev.azure.com/contoso/Fabrikam/_apis/git/pullrequests/42?api-version=7.1"
        );
        assert_eq!(
            stub.url_of(1),
            "https://dev.azure.com/contoso/_apis/connectionData?api-version=7.1"
        );
        assert_eq!(calls[2].method, Method::PUT);
        assert_eq!(
            stub.url_of(2),
            "https://dev.azure.com/contoso/Fabrikam/_apis/git/repositories/R1/pullrequests/42/reviewers/U9?api-version=7.1"
        );
        assert_eq!(calls[2].body, Some(json!({"vote": 10})));
    }

    #[tokio::test]
    async fn test_reject_sends_negative_ten() {
        let stub = StubTransport::new()
            .respond_json(200, pull_request(7, "R2"))
            .respond_json(200, me())
            .respond_json(200, json!({}));

        let outcome = PullRequests::new(&stub)
            .vote("Fabrikam", 7, Vote::Reject)
            .await
            .unwrap();
        assert_eq!(outcome.status, "Rejected");
        assert_eq!(stub.calls()[2].body, Some(json!({"vote": -10})));
    }

    #[tokio::test]
    async fn test_vote_stops_when_identity_lookup_fails() {
        let stub = StubTransport::new()
            .respond_json(200, pull_request(42, "R1"))
            .respond_status(401, "unauthorized");

        let err = PullRequests::new(&stub)
            .vote("Fabrikam", 42, Vote::Approve)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(stub.calls().len(), 2);
        assert!(stub.calls().iter().all(|call| call.method == Method::GET));
    }

    #[tokio::test]
    async fn test_create_validates_before_network() {
        let stub = StubTransport::new();
        let prs = PullRequests::new(&stub);

        let cases = [
            ("", "t", "s", "m", "--repo"),
            ("api", "", "s", "m", "--title"),
            ("api", "t", " ", "m", "--source"),
            ("api", "t", "s", "", "--target"),
        ];
        for (repository, title, source, target, expected) in cases {
            let input = CreatePullRequest {
                repository: repository.to_string(),
                title: title.to_string(),
                source: source.to_string(),
                target: target.to_string(),
                ..Default::default()
            };
            match prs.create("Fabrikam", &input).await {
                Err(ApiError::MissingInput { field }) => assert_eq!(field, expected),
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_resolves_repository_and_prefixes_refs() {
        let stub = StubTransport::new()
            .respond_json(
                200,
                json!({"count": 1, "value": [{"id": "R1", "name": "API"}]}),
            )
            .respond_json(201, pull_request(100, "R1"));

        let input = CreatePullRequest {
            repository: "api".to_string(),
            title: "Add retry budget".to_string(),
            source: "feature/retry".to_string(),
            target: "refs/heads/main".to_string(),
            reviewers: vec!["U5".to_string()],
            is_draft: true,
            ..Default::default()
        };
        let created = PullRequests::new(&stub)
            .create("Fabrikam", &input)
            .await
            .unwrap();
        assert_eq!(created.pull_request_id, 100);

        let calls = stub.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            stub.url_of(1),
            "https://dev.azure.com/contoso/Fabrikam/_apis/git/repositories/R1/pullrequests?api-version=7.1"
        );
        assert_eq!(
            calls[1].body,
            Some(json!({
                "sourceRefName": "refs/heads/feature/retry",
                "targetRefName": "refs/heads/main",
                "title": "Add retry budget",
                "isDraft": true,
                "reviewers": [{"id": "U5"}]
            }))
        );
    }

    #[tokio::test]
    async fn test_create_unknown_repository() {
        let stub = StubTransport::new().respond_json(200, json!({"value": []}));
        let input = CreatePullRequest {
            repository: "ghost".to_string(),
            title: "t".to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
            ..Default::default()
        };
        let err = PullRequests::new(&stub)
            .create("Fabrikam", &input)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(stub.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_list_project_wide_with_filters() {
        let stub = StubTransport::new()
            .respond_json(200, me())
            .respond_json(200, json!({"count": 1, "value": [pull_request(1, "R1")]}));

        let query = PullRequestQuery {
            status: Some("active".to_string()),
            creator: Some("@me".to_string()),
            top: Some(5),
            ..Default::default()
        };
        let prs = PullRequests::new(&stub).list("Fabrikam", &query).await.unwrap();
        assert_eq!(prs.len(), 1);
        assert_eq!(prs[0].source_branch(), "feature/retry");

        assert_eq!(stub.calls().len(), 2);
        assert_eq!(
            stub.url_of(1),
            "https://dev.azure.com/contoso/Fabrikam/_apis/git/pullrequests?searchCriteria.status=active&searchCriteria.creatorId=U9&%24top=5&api-version=7.1"
        );
    }

    #[tokio::test]
    async fn test_list_by_repository_without_filters() {
        let stub = StubTransport::new()
            .respond_json(200, json!({"value": [{"id": "R7", "name": "web"}]}))
            .respond_json(200, json!({"value": []}));

        let query = PullRequestQuery {
            repository: Some("Web".to_string()),
            reviewer: Some("U3".to_string()),
            ..Default::default()
        };
        let prs = PullRequests::new(&stub).list("Fabrikam", &query).await.unwrap();
        assert!(prs.is_empty());
        assert_eq!(
            stub.url_of(1),
            "https://dev.azure.com/contoso/Fabrikam/_apis/git/repositories/R7/pullrequests?searchCriteria.reviewerId=U3&api-version=7.1"
        );
    }
}
