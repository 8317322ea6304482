//! Output streams commands write to.
//!
//! A command never prints. It writes result objects, non-terminating error
//! records and warnings to a [`CommandRuntime`]; the host decides what to
//! show. [`OutputStreams`] collects everything in memory.

use mgmtkit_core::{ErrorCategory, MgmtError};
use serde::Serialize;

use crate::sql::Database;
use crate::store::AddOn;

/// An object written to the output pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineObject {
    /// A SQL database.
    Database(Database),
    /// A store add-on.
    AddOn(AddOn),
    /// A plain success flag.
    Bool(bool),
}

impl PipelineObject {
    /// The database, if this object is one.
    #[must_use]
    pub fn as_database(&self) -> Option<&Database> {
        match self {
            Self::Database(db) => Some(db),
            _ => None,
        }
    }

    /// The add-on, if this object is one.
    #[must_use]
    pub fn as_add_on(&self) -> Option<&AddOn> {
        match self {
            Self::AddOn(add_on) => Some(add_on),
            _ => None,
        }
    }

    /// The flag, if this object is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<Database> for PipelineObject {
    fn from(db: Database) -> Self {
        Self::Database(db)
    }
}

impl From<AddOn> for PipelineObject {
    fn from(add_on: AddOn) -> Self {
        Self::AddOn(add_on)
    }
}

impl From<bool> for PipelineObject {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A non-terminating error: the command reports it and carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Identifies the failing operation, e.g. `GetAzureSqlDatabase`.
    pub error_id: String,
    /// Classification of the failure.
    pub category: ErrorCategory,
    /// The user-visible message.
    pub message: String,
    /// The object the operation targeted.
    pub target: Option<String>,
}

impl ErrorRecord {
    /// Build a record from an error.
    pub fn from_error(error: &MgmtError, error_id: impl Into<String>, target: Option<String>) -> Self {
        Self {
            error_id: error_id.into(),
            category: error.category(),
            message: error.root().to_string(),
            target,
        }
    }
}

/// Where commands write their output.
pub trait CommandRuntime: Send {
    /// Write a result object.
    fn write_object(&mut self, object: PipelineObject);

    /// Write a non-terminating error.
    fn write_error(&mut self, record: ErrorRecord);

    /// Write a warning.
    fn write_warning(&mut self, message: String);
}

/// In-memory [`CommandRuntime`].
#[derive(Debug, Clone, Default)]
pub struct OutputStreams {
    /// Result objects, in write order.
    pub objects: Vec<PipelineObject>,
    /// Error records, in write order.
    pub errors: Vec<ErrorRecord>,
    /// Warnings, in write order.
    pub warnings: Vec<String>,
}

impl OutputStreams {
    /// Create empty streams.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty every stream.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.errors.clear();
        self.warnings.clear();
    }

    /// Move the result objects out, leaving errors and warnings.
    pub fn take_objects(&mut self) -> Vec<PipelineObject> {
        std::mem::take(&mut self.objects)
    }

    /// The databases written, in order.
    #[must_use]
    pub fn databases(&self) -> Vec<&Database> {
        self.objects.iter().filter_map(PipelineObject::as_database).collect()
    }
}

impl CommandRuntime for OutputStreams {
    fn write_object(&mut self, object: PipelineObject) {
        self.objects.push(object);
    }

    fn write_error(&mut self, record: ErrorRecord) {
        tracing::debug!(error_id = %record.error_id, category = %record.category, message = %record.message, "Error record written");
        self.errors.push(record);
    }

    fn write_warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}
