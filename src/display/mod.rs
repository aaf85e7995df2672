//! Display sink
//!
//! Purely observational: accepts a frame plus optional overlay text and
//! feeds nothing back into the control logic. The shipped sink logs
//! overlay transitions; a windowed renderer can be substituted through the
//! trait.

use crate::source::Frame;

pub trait DisplaySink {
    fn present(&mut self, frame: &Frame, overlay: Option<&str>);
}

/// Logs the overlay whenever it changes.
pub struct LogDisplay {
    last_overlay: Option<String>,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self { last_overlay: None }
    }
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for LogDisplay {
    fn present(&mut self, frame: &Frame, overlay: Option<&str>) {
        if self.last_overlay.as_deref() != overlay {
            match overlay {
                Some(text) => log::info!("[{}x{}] {}", frame.width, frame.height, text),
                None => log::debug!("[{}x{}] overlay cleared", frame.width, frame.height),
            }
            self.last_overlay = overlay.map(str::to_string);
        }
    }
}
