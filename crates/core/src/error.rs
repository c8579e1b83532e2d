//! Error types for the take-off engine
//!
//! Every rejection is recoverable: the operation leaves engine state untouched
//! and the caller decides how to present the message.

/// Input validation failures reported by engine operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A line or area measurement was started on an uncalibrated page
    #[error("please calibrate the page before measuring")]
    Uncalibrated,

    /// The known calibration length was zero, negative, or not a number
    #[error("enter a valid distance: calibration length must be greater than zero")]
    NonPositiveLength,

    /// Both calibration points landed on the same pixel
    #[error("calibration points must not coincide")]
    DegenerateReference,

    /// An area was finished with fewer than three vertices
    #[error("an area needs at least 3 points (have {count})")]
    InsufficientVertices { count: usize },

    /// A calibration length was supplied without a reference segment
    #[error("no calibration segment has been drawn")]
    NoPendingCalibration,

    /// A unit symbol outside the supported set
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    /// A tool name outside the supported set
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;
