use ado_cli_api::models::{short_branch, vote_label, PullRequest, Vote};
use ado_cli_api::pullrequests::{CreatePullRequest, PullRequestQuery, PullRequests};
use ado_cli_output::OutputFormat;
use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use super::utils::{split_list, truncate, validate_top, AdoContext};

#[derive(Subcommand, Debug, Clone)]
pub enum PrCommand {
    /// List pull requests in the project or one repository
    List {
        /// Filter by status (active, completed, abandoned, all)
        #[arg(long)]
        status: Option<String>,
        /// Filter by creator identity ID (use @me for yourself)
        #[arg(long)]
        creator: Option<String>,
        /// Filter by reviewer identity ID (use @me for yourself)
        #[arg(long)]
        reviewer: Option<String>,
        /// Repository name
        #[arg(long)]
        repo: Option<String>,
        /// Maximum number of results
        #[arg(long, default_value_t = 20)]
        top: u32,
    },

    /// Show a single pull request
    Show {
        /// Pull request ID
        id: i64,
    },

    /// Open a pull request
    Create {
        /// Repository name
        #[arg(long)]
        repo: String,
        #[arg(long)]
        title: String,
        /// Source branch
        #[arg(long)]
        source: String,
        /// Target branch
        #[arg(long)]
        target: String,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated reviewer identity IDs
        #[arg(long)]
        reviewers: Option<String>,
        /// Create as a draft
        #[arg(long)]
        draft: bool,
    },

    /// Approve a pull request as the authenticated user
    Approve {
        /// Pull request ID
        id: i64,
    },

    /// Reject a pull request as the authenticated user
    Reject {
        /// Pull request ID
        id: i64,
    },
}

pub async fn execute(command: PrCommand, ctx: &AdoContext<'_>) -> Result<()> {
    match command {
        PrCommand::List {
            status,
            creator,
            reviewer,
            repo,
            top,
        } => {
            let query = PullRequestQuery {
                repository: repo,
                status,
                creator,
                reviewer,
                top: Some(validate_top(top)?),
            };
            list(ctx, &query).await
        }
        PrCommand::Show { id } => show(ctx, id).await,
        PrCommand::Create {
            repo,
            title,
            source,
            target,
            description,
            reviewers,
            draft,
        } => {
            let input = CreatePullRequest {
                repository: repo,
                title,
                source,
                target,
                description,
                reviewers: split_list(reviewers.as_deref()),
                is_draft: draft,
            };
            create(ctx, &input).await
        }
        PrCommand::Approve { id } => vote(ctx, id, Vote::Approve).await,
        PrCommand::Reject { id } => vote(ctx, id, Vote::Reject).await,
    }
}

#[derive(Serialize)]
struct Row<'a> {
    id: i64,
    title: String,
    source: &'a str,
    target: &'a str,
    status: &'a str,
    creator: &'a str,
}

impl<'a> Row<'a> {
    fn from_pr(pr: &'a PullRequest) -> Self {
        Self {
            id: pr.pull_request_id,
            title: truncate(&pr.title, 50),
            source: pr.source_branch(),
            target: pr.target_branch(),
            status: &pr.status,
            creator: pr.creator(),
        }
    }
}

#[derive(Serialize)]
struct Summary<'a> {
    id: i64,
    title: &'a str,
}

impl<'a> Summary<'a> {
    fn from_pr(pr: &'a PullRequest) -> Self {
        Self {
            id: pr.pull_request_id,
            title: &pr.title,
        }
    }
}

async fn list(ctx: &AdoContext<'_>, query: &PullRequestQuery) -> Result<()> {
    let project = ctx.project()?;
    let prs = PullRequests::new(&ctx.client)
        .list(project, query)
        .await
        .context("listing pull requests")?;

    let empty = "No pull requests found.";
    match ctx.renderer.format() {
        OutputFormat::Json => ctx.renderer.render_list(&prs, empty),
        OutputFormat::Plain => {
            let lines: Vec<Summary<'_>> = prs.iter().map(Summary::from_pr).collect();
            ctx.renderer.render_list(&lines, empty)
        }
        OutputFormat::Table => {
            let rows: Vec<Row<'_>> = prs.iter().map(Row::from_pr).collect();
            ctx.renderer.render_list(&rows, empty)
        }
    }
}

#[derive(Serialize)]
struct Detail<'a> {
    id: i64,
    title: &'a str,
    status: &'a str,
    draft: bool,
    source: &'a str,
    target: &'a str,
    creator: &'a str,
    created: String,
    merge_status: &'a str,
    repository: &'a str,
    reviewers: String,
    description: &'a str,
}

async fn show(ctx: &AdoContext<'_>, id: i64) -> Result<()> {
    let project = ctx.project()?;
    let pr = PullRequests::new(&ctx.client)
        .get(project, id)
        .await
        .with_context(|| format!("fetching pull request {id}"))?;

    match ctx.renderer.format() {
        OutputFormat::Json => ctx.renderer.render(&pr),
        OutputFormat::Plain => ctx.renderer.render(&Summary::from_pr(&pr)),
        OutputFormat::Table => {
            let reviewers = pr
                .reviewers
                .iter()
                .map(|r| format!("{} ({})", r.display_name, vote_label(r.vote)))
                .collect::<Vec<_>>()
                .join(", ");
            ctx.renderer.render(&Detail {
                id: pr.pull_request_id,
                title: &pr.title,
                status: &pr.status,
                draft: pr.is_draft,
                source: short_branch(&pr.source_ref_name),
                target: short_branch(&pr.target_ref_name),
                creator: pr.creator(),
                created: pr
                    .creation_date
                    .map(|date| date.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                merge_status: pr.merge_status.as_deref().unwrap_or(""),
                repository: &pr.repository.name,
                reviewers,
                description: pr.description.as_deref().unwrap_or(""),
            })
        }
    }
}

async fn create(ctx: &AdoContext<'_>, input: &CreatePullRequest) -> Result<()> {
    let project = ctx.project()?;
    let pr = PullRequests::new(&ctx.client)
        .create(project, input)
        .await
        .with_context(|| {
            format!(
                "creating pull request '{}' in {}",
                input.title, input.repository
            )
        })?;

    match ctx.renderer.format() {
        OutputFormat::Plain => ctx.renderer.render(&Summary::from_pr(&pr)),
        _ => ctx.renderer.render_outcome(
            &format!("Created pull request {}: {}", pr.pull_request_id, pr.title),
            &pr,
        ),
    }
}

async fn vote(ctx: &AdoContext<'_>, id: i64, vote: Vote) -> Result<()> {
    let project = ctx.project()?;
    let outcome = PullRequests::new(&ctx.client)
        .vote(project, id, vote)
        .await
        .with_context(|| format!("voting on pull request {id}"))?;

    match ctx.renderer.format() {
        OutputFormat::Plain => {
            println!("{}\t{}", outcome.pull_request_id, outcome.status);
            Ok(())
        }
        _ => ctx.renderer.render_outcome(
            &format!("{} pull request {}", outcome.status, outcome.pull_request_id),
            &outcome,
        ),
    }
}
