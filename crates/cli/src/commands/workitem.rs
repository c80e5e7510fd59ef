use ado_cli_api::fields;
use ado_cli_api::models::WorkItem;
use ado_cli_api::wiql::WorkItemQuery;
use ado_cli_api::workitems::{CreateWorkItem, UpdateWorkItem, WorkItems};
use ado_cli_output::OutputFormat;
use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use super::utils::{truncate, validate_top, AdoContext};

#[derive(Subcommand, Debug, Clone)]
pub enum WorkItemCommand {
    /// List work items in the project, most recently changed first
    List {
        /// Filter by work item type (e.g. Bug, Task, "User Story")
        #[arg(long = "type")]
        work_item_type: Option<String>,
        /// Filter by state (e.g. Active, Closed)
        #[arg(long)]
        state: Option<String>,
        /// Filter by assignee (use @me for yourself)
        #[arg(long)]
        assigned_to: Option<String>,
        /// Maximum number of work items to return
        #[arg(long, default_value_t = 20)]
        top: u32,
    },

    /// Show a single work item
    Show {
        /// Work item ID
        id: i64,
    },

    /// Create a work item
    Create {
        /// Work item type (e.g. Bug, Task, "User Story")
        #[arg(long = "type")]
        work_item_type: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assigned_to: Option<String>,
        #[arg(long)]
        area_path: Option<String>,
        #[arg(long)]
        iteration_path: Option<String>,
        /// Semicolon-separated tags
        #[arg(long)]
        tags: Option<String>,
    },

    /// Update fields on a work item
    Update {
        /// Work item ID
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        assigned_to: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
}

impl WorkItemCommand {
    /// `show` and `update` address work items by id at the organization level.
    pub fn needs_project(&self) -> bool {
        matches!(self, Self::List { .. } | Self::Create { .. })
    }
}

pub async fn execute(command: WorkItemCommand, ctx: &AdoContext<'_>) -> Result<()> {
    match command {
        WorkItemCommand::List {
            work_item_type,
            state,
            assigned_to,
            top,
        } => {
            let query = WorkItemQuery {
                project: ctx.project()?.to_string(),
                work_item_type,
                state,
                assigned_to,
            };
            list(ctx, &query, validate_top(top)?).await
        }
        WorkItemCommand::Show { id } => show(ctx, id).await,
        WorkItemCommand::Create {
            work_item_type,
            title,
            description,
            assigned_to,
            area_path,
            iteration_path,
            tags,
        } => {
            let input = CreateWorkItem {
                work_item_type,
                title,
                description,
                assigned_to,
                area_path,
                iteration_path,
                tags,
            };
            create(ctx, &input).await
        }
        WorkItemCommand::Update {
            id,
            title,
            state,
            assigned_to,
            description,
            tags,
        } => {
            let input = UpdateWorkItem {
                title,
                state,
                assigned_to,
                description,
                tags,
            };
            update(ctx, id, &input).await
        }
    }
}

#[derive(Serialize)]
struct Row {
    id: i64,
    #[serde(rename = "type")]
    work_item_type: String,
    title: String,
    state: String,
    assigned_to: String,
}

impl Row {
    fn from_item(item: &WorkItem) -> Self {
        Self {
            id: item.id,
            work_item_type: item.work_item_type(),
            title: truncate(&item.title(), 60),
            state: item.state(),
            assigned_to: item.assigned_to(),
        }
    }
}

async fn list(ctx: &AdoContext<'_>, query: &WorkItemQuery, top: u32) -> Result<()> {
    let items = WorkItems::new(&ctx.client)
        .query(query, top as usize)
        .await
        .context("querying work items")?;

    let empty = "No work items found.";
    match ctx.renderer.format() {
        OutputFormat::Json => ctx.renderer.render_list(&items, empty),
        OutputFormat::Plain => {
            let lines: Vec<Summary> = items.iter().map(Summary::from_item).collect();
            ctx.renderer.render_list(&lines, empty)
        }
        OutputFormat::Table => {
            let rows: Vec<Row> = items.iter().map(Row::from_item).collect();
            ctx.renderer.render_list(&rows, empty)
        }
    }
}

/// `id<TAB>title`, the plain form of a single record.
#[derive(Serialize)]
struct Summary {
    id: i64,
    title: String,
}

impl Summary {
    fn from_item(item: &WorkItem) -> Self {
        Self {
            id: item.id,
            title: item.title(),
        }
    }
}

#[derive(Serialize)]
struct Detail {
    id: i64,
    #[serde(rename = "type")]
    work_item_type: String,
    title: String,
    state: String,
    assigned_to: String,
    area_path: String,
    iteration_path: String,
    tags: String,
    description: String,
}

async fn show(ctx: &AdoContext<'_>, id: i64) -> Result<()> {
    let item = WorkItems::new(&ctx.client)
        .get(id)
        .await
        .with_context(|| format!("fetching work item {id}"))?;

    match ctx.renderer.format() {
        OutputFormat::Json => ctx.renderer.render(&item),
        OutputFormat::Plain => ctx.renderer.render(&Summary::from_item(&item)),
        OutputFormat::Table => ctx.renderer.render(&Detail {
            id: item.id,
            work_item_type: item.work_item_type(),
            title: item.title(),
            state: item.state(),
            assigned_to: item.assigned_to(),
            area_path: item.field_display(fields::AREA_PATH),
            iteration_path: item.field_display(fields::ITERATION_PATH),
            tags: item.field_display(fields::TAGS),
            description: item.field_display(fields::DESCRIPTION),
        }),
    }
}

async fn create(ctx: &AdoContext<'_>, input: &CreateWorkItem) -> Result<()> {
    let project = ctx.project()?;
    let item = WorkItems::new(&ctx.client)
        .create(project, input)
        .await
        .with_context(|| {
            format!(
                "creating {} '{}' in {project}",
                input.work_item_type, input.title
            )
        })?;

    emit(ctx, "Created", &item)
}

async fn update(ctx: &AdoContext<'_>, id: i64, input: &UpdateWorkItem) -> Result<()> {
    let item = WorkItems::new(&ctx.client)
        .update(id, input)
        .await
        .with_context(|| format!("updating work item {id}"))?;

    emit(ctx, "Updated", &item)
}

fn emit(ctx: &AdoContext<'_>, verb: &str, item: &WorkItem) -> Result<()> {
    let message = format!("{verb} work item {}: {}", item.id, item.title());
    match ctx.renderer.format() {
        OutputFormat::Plain => ctx.renderer.render(&Summary::from_item(item)),
        _ => ctx.renderer.render_outcome(&message, item),
    }
}
