use reqwest::StatusCode;

/// Errors returned by the PV_Live client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request never produced an HTTP response (DNS, TLS, timeout, ...).
    #[error("could not reach PV_Live ({url})")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status.
    #[error("PV_Live request failed: HTTP {status} for url ({url})\n{message}")]
    Status {
        status: StatusCode,
        url: String,
        message: String,
    },

    /// The body could not be mapped onto records.
    #[error("malformed PV_Live response: {0}")]
    MalformedPayload(String),

    #[error("unknown extra field `{0}` (expected one of: {known})", known = crate::query::ExtraField::known_names())]
    UnknownExtraField(String),

    /// A query input (entity type, period, ...) the service does not accept.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[cfg(feature = "dataframe")]
    #[error("failed to build DataFrame")]
    Frame(#[from] polars::prelude::PolarsError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiErrorResponse {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<u16>,
    #[serde(default)]
    pub(crate) detail: Option<String>,
    // Some deployments answer with {"message": ...} or {"error": ...}
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

pub(crate) fn format_api_error(status: StatusCode, url: &str, body: &str) -> Error {
    let message = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(e) => {
            let title = e
                .title
                .as_deref()
                .or(e.message.as_deref())
                .or(e.error.as_deref())
                .unwrap_or("");
            let detail = e.detail.as_deref().unwrap_or("");
            let status_in_body = e.status.filter(|s| *s != status.as_u16());
            let mut parts: Vec<String> = [title, detail]
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
            if let Some(s) = status_in_body {
                parts.push(format!("(server reported status {s})"));
            }
            parts.join("\n")
        }
        Err(_) => body.trim().to_string(),
    };

    let message = if status == StatusCode::NOT_FOUND && message.is_empty() {
        "endpoint not found; check the configured base url and entity id".to_string()
    } else {
        message
    };

    Error::Status {
        status,
        url: url.to_string(),
        message,
    }
}
