// THEORY:
// Every stage of the segmentation stack reports failure through one typed error.
// A stage checks its own inputs and returns the first invalid condition it sees;
// nothing downstream ever receives a clamped or defaulted parameter in its place.
// The computation is pure, so none of these errors is retryable without changing
// the input.

use thiserror::Error;

/// Errors raised by the segmentation stages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    /// The grid has zero rows or zero columns.
    #[error("image is empty ({rows}x{cols})")]
    EmptyImage { rows: usize, cols: usize },

    /// The input is not a single-channel 8-bit image.
    #[error("unsupported pixel depth: {detail}")]
    UnsupportedDepth { detail: String },

    /// A tunable is outside its accepted range.
    #[error("invalid parameter `{name}`: {value} ({expected})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// A bounded label store ran out of slots.
    #[error("label capacity of {capacity} exceeded")]
    CapacityExceeded { capacity: usize },

    /// A raw buffer does not match the declared grid dimensions.
    #[error("buffer holds {actual} cells but the grid needs {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, SegmentError>;

impl SegmentError {
    pub(crate) fn invalid(
        name: &'static str,
        value: impl ToString,
        expected: &'static str,
    ) -> Self {
        SegmentError::InvalidParameter {
            name,
            value: value.to_string(),
            expected,
        }
    }
}
