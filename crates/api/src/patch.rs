use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::fields::patch_path;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: Value,
}

/// Builder for the JSON Patch document sent to create or update a work item.
///
/// Every operation uses the op kind chosen at construction. Absent or empty
/// inputs are skipped entirely, so this builder can never clear a field.
pub struct PatchDocument {
    op: PatchOp,
    operations: Vec<PatchOperation>,
}

impl PatchDocument {
    pub fn new(op: PatchOp) -> Self {
        Self {
            op,
            operations: Vec::new(),
        }
    }

    /// Add a field that must be present; `input` names the flag for the error.
    pub fn required(self, field: &str, input: &'static str, value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(ApiError::MissingInput { field: input });
        }
        Ok(self.push(field, value))
    }

    /// Add a field only when a non-empty value was supplied.
    pub fn optional(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.push(field, v),
            _ => self,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn finish(self) -> Vec<PatchOperation> {
        self.operations
    }

    fn push(mut self, field: &str, value: &str) -> Self {
        self.operations.push(PatchOperation {
            op: self.op,
            path: patch_path(field),
            value: Value::String(value.to_string()),
        });
        self
    }
}
