//! # emogo-api — Request/Response DTOs
//!
//! Conventions:
//! - `*Query`    → deserialized from query params
//! - `*Response` → serialized to client JSON
//!
//! The ingestion body is not listed here; it is read as raw JSON and turned
//! into a `LogEntry` by `schema::validate_log_entry`.

use serde::{Deserialize, Serialize};

use crate::models::LogId;
use crate::store::Page;

/// POST /api/logs
#[derive(Debug, Serialize)]
pub struct CreateLogResponse {
    /// Opaque identifier, serialized as a string
    pub inserted_id: String,
}

impl From<LogId> for CreateLogResponse {
    fn from(id: LogId) -> Self {
        Self {
            inserted_id: id.to_string(),
        }
    }
}

/// GET /export/{view} query params. Both optional; without them the whole
/// collection is returned.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub limit: Option<u32>,
    pub offset: Option<u64>,
}

impl From<ExportQuery> for Page {
    fn from(query: ExportQuery) -> Self {
        Page {
            limit: query.limit,
            offset: query.offset.unwrap_or(0),
        }
    }
}
