use crate::spreadsheet::ResourceError;
use thiserror::Error;

/// Main error type for table region operations.
/// Aggregates resource failures and the controller's own error kinds.
#[derive(Error, Debug)]
pub enum RegionError {
    /// The workbook or sheet named by the configuration cannot be bound
    #[error("Cannot open '{target}': {source}")]
    ResourceOpen {
        target: String,
        #[source]
        source: ResourceError,
    },

    /// Header lookup miss
    #[error("Column '{name}' not found in header")]
    ColumnNotFound { name: String },

    /// Configuration value rejected before touching the resource
    #[error("Invalid configuration '{field}': {message}")]
    InvalidConfig { field: &'static str, message: String },

    /// A1 string that does not describe a range
    #[error("Invalid range format '{0}'")]
    InvalidRange(String),

    // Resource errors (out-of-bounds access included) pass through unmodified
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

pub type Result<T> = std::result::Result<T, RegionError>;

pub(crate) trait ResultOpenTarget<T> {
    fn opening(self, target: impl FnOnce() -> String) -> Result<T>;
}

impl<T> ResultOpenTarget<T> for std::result::Result<T, ResourceError> {
    /// Reclassifies a resource failure as a failure to bind `target`.
    fn opening(self, target: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|source| RegionError::ResourceOpen {
            target: target(),
            source,
        })
    }
}
