use serde_json::Value;

use crate::error::{Error, Result};

/// Body returned by `GET <base>/<entity_type>/<entity_id>`.
///
/// ```json
/// {"data": [[0, "2018-06-03T12:30:00Z", 5432.1]], "meta": ["pes_id", "datetime_gmt", "generation_mw"]}
/// ```
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiPayload {
    pub(crate) data: Vec<Vec<Value>>,
    pub(crate) meta: Vec<String>,
}

impl ApiPayload {
    pub(crate) fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::MalformedPayload(e.to_string()))
    }

    /// Position of `name` in `meta`.
    pub(crate) fn column(&self, name: &str) -> Option<usize> {
        self.meta.iter().position(|m| m == name)
    }

    pub(crate) fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| {
            Error::MalformedPayload(format!(
                "missing column `{}` (got: {})",
                name,
                self.meta.join(", ")
            ))
        })
    }
}
