//! Error types for the `bioturbation` crate.
//!
//! Every fallible operation returns [`BioturbationError`] through the
//! [`Result`] alias. [`BioturbationError::kind`] folds the variants into the
//! coarse classes callers branch on.

use crate::config::ConfigError;
use crate::soil::ProfileId;
use crate::series::SimulationId;

pub type Result<T> = std::result::Result<T, BioturbationError>;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    SteadyStateNotReached,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum BioturbationError {
    /// A layer record is missing one of its required attributes.
    #[error("layer {layer} is missing required field `{field}`")]
    MissingField {
        /// 1-based layer id in profile order.
        layer: usize,
        /// Name of the absent attribute.
        field: &'static str,
    },

    /// Model 1 derives its rate by dividing by depth.
    #[error("layer {layer} has zero depth")]
    ZeroDepth {
        /// 1-based layer id in profile order.
        layer: usize,
    },

    /// Depth must be a finite, non-negative thickness.
    #[error("layer {layer} has invalid depth {depth}")]
    InvalidDepth {
        /// 1-based layer id in profile order.
        layer: usize,
        depth: f64,
    },

    #[error("soil profile has no layers")]
    EmptyProfile,

    #[error("soil profile not found: {0}")]
    ProfileNotFound(ProfileId),

    #[error("simulation not found: {0}")]
    SimulationNotFound(SimulationId),

    /// Model 1 ran out of iterations before the layers equalised.
    #[error("steady state not reached after {iterations} iterations")]
    SteadyStateNotReached {
        /// Steps applied before giving up.
        iterations: usize,
    },

    /// A store's lock was poisoned by a panicking writer.
    #[error("{0} store is unavailable")]
    StoreUnavailable(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("json encoding failure: {0}")]
    Json(#[from] serde_json::Error),
}

impl BioturbationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. }
            | Self::ZeroDepth { .. }
            | Self::InvalidDepth { .. }
            | Self::EmptyProfile => {
                ErrorKind::Validation
            }
            Self::Config(ConfigError::Io { .. }) => ErrorKind::Io,
            Self::Config(_) => ErrorKind::Validation,
            Self::ProfileNotFound(_) | Self::SimulationNotFound(_) => ErrorKind::NotFound,
            Self::SteadyStateNotReached { .. } => ErrorKind::SteadyStateNotReached,
            Self::StoreUnavailable(_) | Self::Io(_) | Self::Json(_) => ErrorKind::Io,
        }
    }
}
