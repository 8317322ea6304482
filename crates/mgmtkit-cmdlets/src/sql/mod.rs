//! SQL database access.

mod client;
mod model;

pub use client::{
    CLIENT_REQUEST_ID_HEADER, CLIENT_SESSION_ID_HEADER, DATA_SERVICE_VERSION_HEADER,
    MAX_DATA_SERVICE_VERSION_HEADER, ODATA_ACCEPT, ODATA_VERSION, SqlClientConfig,
    SqlDatabaseClient,
};
pub use model::Database;
