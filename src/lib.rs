//! Gesture Camera - hand-gesture control for a camera feed
//!
//! Turns a live stream of hand-pose observations into debounced control
//! events: thumbs up/down toggles the camera's power state, and a sustained
//! open palm triggers a screenshot. Landmark extraction runs out of band on
//! a detection thread while the render loop stays responsive.

pub mod app;
pub mod capture;
pub mod config;
pub mod debounce;
pub mod detector;
pub mod display;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod power;
pub mod source;

pub use error::ControlError;
