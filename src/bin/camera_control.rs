//! Gesture camera power control - entry point
//!
//! Thumbs up turns the camera on, thumbs down turns it off. While off, the
//! camera is briefly reacquired every couple of seconds to watch for the
//! re-enable gesture.

use gesture_camera::app::CameraControlApp;
use gesture_camera::config::{ControlTiming, GestureThresholds};
use gesture_camera::detector::OnnxHandDetector;
use gesture_camera::display::LogDisplay;
use gesture_camera::source::NokhwaFrameSource;
use gesture_camera::ControlError;

fn run() -> Result<(), ControlError> {
    let source = NokhwaFrameSource::new(0);
    let detector = Box::new(OnnxHandDetector::new()?);

    let mut app = CameraControlApp::new(
        source,
        detector,
        LogDisplay::new(),
        ControlTiming::default(),
        GestureThresholds::default(),
    )?;
    app.run()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Gesture camera control v0.1.0");

    if let Err(e) = run() {
        log::error!("Error: {}", e);
        std::process::exit(1);
    }
}
