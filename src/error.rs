//! Error taxonomy for the control loops

use thiserror::Error;

/// Errors that can occur while driving the camera and capture actions.
///
/// Only `ResourceUnavailable` at startup terminates the process; everything
/// else is contained within the tick that produced it.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("camera unavailable: {0}")]
    ResourceUnavailable(String),
    #[error("frame read failed: {0}")]
    ReadFailed(String),
    #[error("screenshot write failed: {0}")]
    Io(#[from] std::io::Error),
}
