use thiserror::Error;

/// Fallback used when a failed response carries no readable message.
pub const GENERIC_FAILURE: &str = "Request failed";

pub type Result<T> = std::result::Result<T, AdminApiError>;

/// Failures surfaced by the admin API client.
///
/// A provisioning job that ended in `FAILED` is not an error here: that arrives as a
/// normal [`crate::model::ProvisioningRecord`] through the success path.
#[derive(Error, Debug)]
pub enum AdminApiError {
    /// HTTP 401. The stored token has already been cleared when this is returned.
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Request { status: u16, message: String },

    /// 2xx response whose envelope reported `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response is missing '{field}'")]
    MissingField { field: String },
}

impl AdminApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdminApiError::NotFound { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AdminApiError::Unauthorized { .. })
    }

    /// HTTP status behind the error, when there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AdminApiError::Unauthorized { .. } => Some(401),
            AdminApiError::NotFound { .. } => Some(404),
            AdminApiError::Request { status, .. } => Some(*status),
            AdminApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A missing activation field, caught before any request is issued.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Please select a theme")]
    MissingTheme,

    #[error("Please select a plan")]
    MissingPlan,

    #[error("Please provide either a subdomain or custom domain")]
    MissingDomain,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
