//! Reference names of the work item fields this client reads and writes.
//!
//! Renderers project records through these names; they are stable across
//! process types (Agile, Scrum, Basic) on the service side.

pub const ID: &str = "System.Id";
pub const TITLE: &str = "System.Title";
pub const STATE: &str = "System.State";
pub const WORK_ITEM_TYPE: &str = "System.WorkItemType";
pub const ASSIGNED_TO: &str = "System.AssignedTo";
pub const DESCRIPTION: &str = "System.Description";
pub const AREA_PATH: &str = "System.AreaPath";
pub const ITERATION_PATH: &str = "System.IterationPath";
pub const TAGS: &str = "System.Tags";
pub const TEAM_PROJECT: &str = "System.TeamProject";
pub const CHANGED_DATE: &str = "System.ChangedDate";

/// Patch document path for a field (`/fields/System.Title`).
pub fn patch_path(field: &str) -> String {
    format!("/fields/{field}")
}
