use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::fields;
use crate::models::{ValueList, WiqlResult, WorkItem};
use crate::patch::{PatchDocument, PatchOp, PatchOperation};
use crate::transport::{send, ContentType, Request, Target, Transport};
use crate::wiql::WorkItemQuery;

/// The batch endpoint refuses more ids than this in one call.
pub const MAX_BATCH: usize = 200;

#[derive(Clone, Debug, Default)]
pub struct CreateWorkItem {
    pub work_item_type: String,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
    pub tags: Option<String>,
}

impl CreateWorkItem {
    pub fn to_patch(&self) -> Result<Vec<PatchOperation>> {
        if self.work_item_type.is_empty() {
            return Err(ApiError::MissingInput { field: "--type" });
        }

        Ok(PatchDocument::new(PatchOp::Add)
            .required(fields::TITLE, "--title", &self.title)?
            .optional(fields::DESCRIPTION, self.description.as_deref())
            .optional(fields::ASSIGNED_TO, self.assigned_to.as_deref())
            .optional(fields::AREA_PATH, self.area_path.as_deref())
            .optional(fields::ITERATION_PATH, self.iteration_path.as_deref())
            .optional(fields::TAGS, self.tags.as_deref())
            .finish())
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpdateWorkItem {
    pub title: Option<String>,
    pub state: Option<String>,
    pub assigned_to: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
}

impl UpdateWorkItem {
    pub fn to_patch(&self) -> Result<Vec<PatchOperation>> {
        let doc = PatchDocument::new(PatchOp::Replace)
            .optional(fields::TITLE, self.title.as_deref())
            .optional(fields::STATE, self.state.as_deref())
            .optional(fields::ASSIGNED_TO, self.assigned_to.as_deref())
            .optional(fields::DESCRIPTION, self.description.as_deref())
            .optional(fields::TAGS, self.tags.as_deref());

        if doc.is_empty() {
            return Err(ApiError::NothingToUpdate {
                hint: "use --title, --state, --assigned-to, --description, or --tags",
            });
        }
        Ok(doc.finish())
    }
}

pub struct WorkItems<'a> {
    transport: &'a dyn Transport,
}

impl<'a> WorkItems<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    /// Run the query, then fetch up to `top` full records in one batch call.
    pub async fn query(&self, query: &WorkItemQuery, top: usize) -> Result<Vec<WorkItem>> {
        let cap = top.clamp(1, MAX_BATCH);
        let wiql = query.to_wiql();
        debug!(%wiql, cap, "Running WIQL query");

        let url = self
            .transport
            .endpoint()
            .project_url(&query.project, &format!("wit/wiql?$top={cap}"))?;
        let request = Request::new(Method::POST, Target::Url(url)).with_json(&json!({ "query": wiql }))?;
        let result: WiqlResult = send(self.transport, request).await?;

        let ids: Vec<i64> = result
            .work_items
            .iter()
            .take(cap)
            .map(|reference| reference.id)
            .collect();
        debug!(matched = result.work_items.len(), fetching = ids.len(), "Query returned references");

        self.get_many(&ids).await
    }

    pub async fn get(&self, id: i64) -> Result<WorkItem> {
        send(
            self.transport,
            Request::get(Target::Org(format!("wit/workitems/{id}"))),
        )
        .await
    }

    /// Batch fetch; no request is made for an empty id list.
    pub async fn get_many(&self, ids: &[i64]) -> Result<Vec<WorkItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let list: ValueList<WorkItem> = send(
            self.transport,
            Request::get(Target::Org(format!("wit/workitems?ids={joined}"))),
        )
        .await?;
        Ok(list.value)
    }

    pub async fn create(&self, project: &str, input: &CreateWorkItem) -> Result<WorkItem> {
        let operations = input.to_patch()?;

        let url = self.transport.endpoint().project_url(
            project,
            &format!("wit/workitems/${}", input.work_item_type),
        )?;
        let request = Request::new(Method::POST, Target::Url(url))
            .with_content_type(ContentType::JsonPatch)
            .with_json(&operations)?;
        let created: WorkItem = send(self.transport, request).await?;

        info!(id = created.id, work_item_type = %input.work_item_type, "Work item created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: &UpdateWorkItem) -> Result<WorkItem> {
        let operations = input.to_patch()?;

        let request = Request::new(Method::PATCH, Target::Org(format!("wit/workitems/{id}")))
            .with_content_type(ContentType::JsonPatch)
            .with_json(&operations)?;
        let updated: WorkItem = send(self.transport, request).await?;

        info!(id = updated.id, rev = updated.rev, fields = operations.len(), "Work item updated");
        Ok(updated)
    }
}
