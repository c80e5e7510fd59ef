use crate::fields;

/// Sentinel a user passes to mean "the authenticated caller".
pub const CURRENT_USER: &str = "@me";

const DEFAULT_COLUMNS: [&str; 5] = [
    fields::ID,
    fields::TITLE,
    fields::STATE,
    fields::WORK_ITEM_TYPE,
    fields::ASSIGNED_TO,
];

/// Builder for WIQL (Work Item Query Language) queries from filter parameters
pub struct WiqlBuilder {
    columns: Vec<String>,
    conditions: Vec<String>,
    order_by: Option<String>,
}

impl WiqlBuilder {
    pub fn new() -> Self {
        Self {
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            conditions: Vec::new(),
            order_by: None,
        }
    }

    /// Add an equality condition ([field] = value)
    pub fn eq(mut self, field: &str, value: &str) -> Self {
        let normalized = Self::normalize_value(field, value);
        self.conditions.push(format!("[{}] = {}", field, normalized));
        self
    }

    /// Add an equality condition only when the value is present and non-empty
    pub fn eq_opt(self, field: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.eq(field, v),
            _ => self,
        }
    }

    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by = Some(format!("[{}] DESC", field));
        self
    }

    /// Build the final WIQL query string
    pub fn finish(self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| format!("[{c}]")).collect();
        let mut query = format!("SELECT {} FROM WorkItems", columns.join(", "));

        if !self.conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.conditions.join(" AND "));
        }

        if let Some(order) = self.order_by {
            query.push_str(" ORDER BY ");
            query.push_str(&order);
        }

        query
    }

    /// Quote a literal, doubling embedded single quotes
    fn escape_and_quote(value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Normalize special values based on field context
    fn normalize_value(field: &str, value: &str) -> String {
        match (field, value) {
            // @me is a WIQL macro, not a literal
            (fields::ASSIGNED_TO, CURRENT_USER) => CURRENT_USER.to_string(),
            _ => Self::escape_and_quote(value),
        }
    }
}

impl Default for WiqlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Work item filter compiled into one WIQL string.
///
/// Clause order is fixed: project scope, then type, state and assignee.
#[derive(Clone, Debug, Default)]
pub struct WorkItemQuery {
    pub project: String,
    pub work_item_type: Option<String>,
    pub state: Option<String>,
    pub assigned_to: Option<String>,
}

impl WorkItemQuery {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Default::default()
        }
    }

    pub fn to_wiql(&self) -> String {
        WiqlBuilder::new()
            .eq(fields::TEAM_PROJECT, &self.project)
            .eq_opt(fields::WORK_ITEM_TYPE, self.work_item_type.as_deref())
            .eq_opt(fields::STATE, self.state.as_deref())
            .eq_opt(fields::ASSIGNED_TO, self.assigned_to.as_deref())
            .order_by_desc(fields::CHANGED_DATE)
            .finish()
    }
}
