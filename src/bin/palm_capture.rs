//! Open-palm screenshot capture - entry point
//!
//! Holding an open palm toward the camera for three seconds saves the
//! current frame as a PNG in the pictures directory.

use std::path::PathBuf;

use gesture_camera::app::PalmCaptureApp;
use gesture_camera::capture::PngScreenshotWriter;
use gesture_camera::config::{ControlTiming, GestureThresholds};
use gesture_camera::detector::OnnxHandDetector;
use gesture_camera::display::LogDisplay;
use gesture_camera::source::NokhwaFrameSource;
use gesture_camera::ControlError;

fn pictures_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Pictures")
}

fn run() -> Result<(), ControlError> {
    let source = NokhwaFrameSource::new(0);
    let detector = Box::new(OnnxHandDetector::new()?);
    let executor = PngScreenshotWriter::new(pictures_dir())?;

    let mut app = PalmCaptureApp::new(
        source,
        detector,
        executor,
        LogDisplay::new(),
        ControlTiming::default(),
        GestureThresholds::default(),
    )?;
    app.run()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Open palm screenshot capture v0.1.0");

    if let Err(e) = run() {
        log::error!("Error: {}", e);
        std::process::exit(1);
    }
}
