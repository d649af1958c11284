use std::error::Error;
use std::fmt::{Display, Formatter};

/// Error kind that represents failures reported by the [`crate::OverrideStore`] and the
/// [`crate::ServerFeatures`] plugin.
///
/// The numeric value of each kind is also used as the `event_id` of the log record
/// emitted for the failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No error occurred.
    NoError = 0,
    /// The persisted override blob was not a valid mapping of guild ids to feature names.
    /// This kind is only reported through the log, the store recovers by starting empty.
    MalformedState = 1000,
    /// The settings subsystem rejected the write of the updated override table.
    PersistenceFailure = 2000,
    /// The settings key used to persist the override table is empty.
    InvalidSettingsKey = 3000,
    /// A collaborator required by the plugin was not supplied when starting it.
    DependencyUnavailable = 3100,
}

impl ErrorKind {
    pub(crate) fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Error struct that holds the [`ErrorKind`] and message of the reported failure.
#[derive(Debug, PartialEq)]
pub struct StoreError {
    /// Error kind that represents the reported failure.
    pub kind: ErrorKind,
    /// The text representation of the failure.
    pub message: String,
}

impl StoreError {
    pub(crate) fn new(kind: ErrorKind, message: String) -> Self {
        Self { message, kind }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message.as_str())
    }
}

impl Error for StoreError {}
