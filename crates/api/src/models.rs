use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fields;

/// The `{count, value}` envelope the service wraps around every list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueList<T> {
    #[serde(default)]
    pub count: Option<u32>,
    pub value: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    #[serde(default)]
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_name: Option<String>,
    /// `imageUrl`, `descriptor`, `_links` and whatever else the service sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One value of a work item's open-ended field map.
///
/// Variant order matters for untagged decoding: an object only becomes an
/// `Identity` when it carries `displayName`, anything else lands in `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Identity(IdentityRef),
    Other(Value),
}

impl FieldValue {
    pub fn display(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
            FieldValue::Identity(identity) => identity.display_name.clone(),
            FieldValue::Other(other) => serde_json::to_string(other).unwrap_or_default(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    #[serde(default)]
    pub rev: i64,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub url: String,
}

impl WorkItem {
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Display string for a field; empty when the field is absent.
    pub fn field_display(&self, name: &str) -> String {
        self.field(name).map(FieldValue::display).unwrap_or_default()
    }

    pub fn title(&self) -> String {
        self.field_display(fields::TITLE)
    }

    pub fn state(&self) -> String {
        self.field_display(fields::STATE)
    }

    pub fn work_item_type(&self) -> String {
        self.field_display(fields::WORK_ITEM_TYPE)
    }

    pub fn assigned_to(&self) -> String {
        self.field_display(fields::ASSIGNED_TO)
    }
}

/// Lightweight reference returned by a WIQL query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItemRef {
    pub id: i64,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WiqlResult {
    #[serde(default)]
    pub work_items: Vec<WorkItemRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_name: Option<String>,
    #[serde(default)]
    pub vote: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub pull_request_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<IdentityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_ref_name: String,
    #[serde(default)]
    pub target_ref_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_status: Option<String>,
    #[serde(default)]
    pub is_draft: bool,
    pub repository: RepositoryRef,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    #[serde(default)]
    pub url: String,
}

impl PullRequest {
    pub fn source_branch(&self) -> &str {
        short_branch(&self.source_ref_name)
    }

    pub fn target_branch(&self) -> &str {
        short_branch(&self.target_ref_name)
    }

    pub fn creator(&self) -> &str {
        self.created_by
            .as_ref()
            .map(|identity| identity.display_name.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionData {
    pub authenticated_user: IdentityRef,
}

/// Reviewer votes as the service encodes them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Vote {
    Approve,
    ApproveWithSuggestions,
    NoVote,
    WaitForAuthor,
    Reject,
}

impl Vote {
    pub fn value(self) -> i32 {
        match self {
            Vote::Approve => 10,
            Vote::ApproveWithSuggestions => 5,
            Vote::NoVote => 0,
            Vote::WaitForAuthor => -5,
            Vote::Reject => -10,
        }
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            10 => Some(Vote::Approve),
            5 => Some(Vote::ApproveWithSuggestions),
            0 => Some(Vote::NoVote),
            -5 => Some(Vote::WaitForAuthor),
            -10 => Some(Vote::Reject),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Vote::Approve => "Approved",
            Vote::ApproveWithSuggestions => "Approved with suggestions",
            Vote::NoVote => "No vote",
            Vote::WaitForAuthor => "Waiting for author",
            Vote::Reject => "Rejected",
        }
    }
}

/// Human label for a raw reviewer vote, falling back to the number.
pub fn vote_label(value: i32) -> String {
    Vote::from_value(value)
        .map(|vote| vote.label().to_string())
        .unwrap_or_else(|| value.to_string())
}

pub fn short_branch(reference: &str) -> &str {
    reference.strip_prefix("refs/heads/").unwrap_or(reference)
}

/// `main` becomes `refs/heads/main`; anything already under `refs/` is kept.
pub fn ensure_ref(branch: &str) -> String {
    if branch.starts_with("refs/") {
        branch.to_string()
    } else {
        format!("refs/heads/{branch}")
    }
}
