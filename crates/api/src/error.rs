use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Azure DevOps API error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid organization '{0}': expected a name or an http(s) URL")]
    InvalidOrganization(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("{kind} \"{name}\" not found in project \"{scope}\"")]
    NotFound {
        kind: &'static str,
        name: String,
        scope: String,
    },

    #[error("{field} is required")]
    MissingInput { field: &'static str },

    #[error("no fields to update ({hint})")]
    NothingToUpdate { hint: &'static str },
}

impl ApiError {
    /// Status code of a failed round trip, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::Status { status: 401, .. } => {
                Some("Verify your personal access token using: ado auth status")
            }
            ApiError::Status { status: 403, .. } => {
                Some("The token is valid but lacks the scope required for this operation")
            }
            ApiError::Status { status: 404, .. } => {
                Some("Check that the ID and the project are correct")
            }
            ApiError::NotFound { .. } => Some("Check the spelling of the name (matching ignores case)"),
            ApiError::Request(err) if err.is_timeout() => {
                Some("Check your network connection or raise --timeout")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_carries_code_and_body() {
        let err = ApiError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("not found"));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_not_found_names_kind_and_scope() {
        let err = ApiError::NotFound {
            kind: "repository",
            name: "gamma".to_string(),
            scope: "Fabrikam".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "repository \"gamma\" not found in project \"Fabrikam\""
        );
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            ApiError::MissingInput { field: "--title" }.to_string(),
            "--title is required"
        );
        assert!(ApiError::NothingToUpdate { hint: "use --title" }
            .to_string()
            .starts_with("no fields to update"));
    }

    #[test]
    fn test_suggestions_by_status() {
        let unauthorized = ApiError::Status {
            status: 401,
            body: String::new(),
        };
        assert!(unauthorized.suggestion().unwrap().contains("ado auth status"));

        let conflict = ApiError::Status {
            status: 409,
            body: String::new(),
        };
        assert!(conflict.suggestion().is_none());
    }
}
