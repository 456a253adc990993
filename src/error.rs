//! Error type shared by the catalog loader, calibration loader and renderer.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by this crate.
///
/// `DataUnavailable` and `CalibrationMissing` abort a render.
/// `InvalidParameter` is raised before any projection work starts.
/// `ProjectionUndefined` is only ever recovered locally: the renderer skips the
/// affected segment and logs the error instead of returning it.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// A data file is missing, unreadable, or malformed.
    #[error("data unavailable from {}: {reason}", .path.display())]
    DataUnavailable { path: PathBuf, reason: String },

    /// No calibration entry exists for the requested image.
    #[error("no calibration for image '{image}' in {}", .path.display())]
    CalibrationMissing { image: String, path: PathBuf },

    /// A parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The projector produced a non-finite pixel coordinate for a segment.
    #[error("projection undefined for segment {index}")]
    ProjectionUndefined { index: usize },
}

impl OverlayError {
    pub(crate) fn data_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        OverlayError::DataUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;
