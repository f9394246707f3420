//! Error types for GeoCRS

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrsError {
    // Registry errors
    #[error("Unknown CRS: {code}")]
    UnknownCrs { code: String, store: Option<String> },

    #[error("CRS store '{store}' could not be loaded: {reason}")]
    CrsStore { store: String, reason: String },

    // Transformation errors
    #[error("No transformation path from {source_crs} to {target_crs}: {reason}")]
    NoTransformationPath {
        source_crs: String,
        target_crs: String,
        reason: String,
    },

    #[error("Transforming point {index} from {source_crs} to {target_crs} failed: {reason}")]
    PointTransformation {
        source_crs: String,
        target_crs: String,
        index: usize,
        reason: String,
    },

    #[error("Coordinate outside of the valid domain: {reason}")]
    OutOfDomain { reason: String },

    // Construction-time validation
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    // Point fitting errors
    #[error("{kind} fit needs at least {required} control points, got {actual}")]
    InsufficientPoints {
        kind: String,
        required: usize,
        actual: usize,
    },

    #[error("Degenerate control points: {reason}")]
    DegenerateControlPoints { reason: String },

    #[error("Cannot {operation} while the session is {state}")]
    InvalidState { operation: String, state: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CrsError {
    /// Shorthand for construction-time parameter validation failures
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CrsError::InvalidParameter { name: name.into(), reason: reason.into() }
    }

    /// Shorthand for a single-point domain violation
    pub fn out_of_domain(reason: impl Into<String>) -> Self {
        CrsError::OutOfDomain { reason: reason.into() }
    }

    /// Whether this error belongs to the transformation family: a missing path,
    /// a failed point, a domain violation, or an under-determined fit.
    pub fn is_transformation_error(&self) -> bool {
        matches!(
            self,
            CrsError::NoTransformationPath { .. }
                | CrsError::PointTransformation { .. }
                | CrsError::OutOfDomain { .. }
                | CrsError::InsufficientPoints { .. }
                | CrsError::DegenerateControlPoints { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CrsError>;
