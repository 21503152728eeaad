use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or analyzing a single recording.
///
/// Every variant is fatal to the file it concerns. The batch driver logs it,
/// skips the file and moves on to the next one.
#[derive(Error, Debug)]
pub enum CpsError {
    /// Cutoffs out of range for the sample rate, or inverted.
    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(String),

    #[error("invalid detector settings: {0}")]
    InvalidDetectorSpec(String),

    #[error("invalid frame settings: {0}")]
    InvalidFrameSpec(String),

    #[error("smoothing window must be at least 1 frame")]
    InvalidSmoothingWindow,

    /// The requested source could not be located or opened.
    #[error("input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("no supported audio track in {}", .0.display())]
    NoAudioTrack(PathBuf),

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CpsResult<T> = std::result::Result<T, CpsError>;
