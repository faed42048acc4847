//! Error types for action space configuration and dispatch

use thiserror::Error;

use crate::kinds::ActionKind;
use crate::space::ActionField;

/// A configuration cannot produce what was asked of it.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown preset name: {0}")]
    UnknownPreset(String),

    #[error("screen_width and screen_height must be specified")]
    MissingScreenGeometry,

    #[error("invalid screen size {width}x{height}")]
    InvalidScreenSize { width: f64, height: f64 },

    /// The one-time geometry fixup already happened.
    #[error("screen geometry is already set")]
    GeometryAlreadySet,

    #[error("action_types must not be empty")]
    EmptyActionTypes,

    #[error("action type {0} is listed more than once")]
    DuplicateActionType(ActionKind),

    #[error("allowed key {0} is listed more than once")]
    DuplicateKey(String),

    #[error("invalid action space config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while interpreting or executing one action instance.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The kind is configured but nothing is wired to run it.
    #[error("unsupported action type: {0}")]
    UnsupportedAction(ActionKind),

    #[error("{field} index {index} out of range for {len} values")]
    IndexOutOfRange {
        field: ActionField,
        index: usize,
        len: usize,
    },

    #[error("{kind} action is missing the {field} field")]
    MissingField { kind: ActionKind, field: ActionField },

    /// Failure reported by the automation driver, passed through untouched.
    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

impl ActionError {
    /// Whether the failure came from the driver rather than the caller or configuration.
    pub fn is_driver(&self) -> bool {
        matches!(self, ActionError::Driver(_))
    }
}
