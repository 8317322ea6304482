//! Database entities as returned by the OData endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A database on a SQL server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Database {
    /// Server-assigned id.
    pub id: i64,
    /// Database name.
    pub name: String,
    /// Collation, e.g. `SQL_Latin1_General_CP1_CI_AS`.
    pub collation_name: String,
    /// Edition, e.g. `Web` or `Business`.
    pub edition: String,
    /// Maximum size in gigabytes.
    #[serde(rename = "MaxSizeGB")]
    pub max_size_gb: i32,
    /// When the database was created.
    pub creation_date: DateTime<Utc>,
    /// Whether the database belongs to the system (e.g. `master`).
    #[serde(default)]
    pub is_system_object: bool,
}

/// The envelope of an OData collection response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ODataFeed<T> {
    pub value: Vec<T>,
}

/// The envelope of an OData error response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ODataErrorBody {
    #[serde(rename = "odata.error")]
    pub error: ODataError,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ODataError {
    pub code: Option<String>,
    pub message: ODataMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ODataMessage {
    pub value: String,
}
