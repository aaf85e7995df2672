//! Frame source
//!
//! Power-cyclable camera abstraction plus the nokhwa-backed implementation.
//! `open` after `close` is safe to call repeatedly; the Off-state polling
//! policy relies on that.

use std::time::Instant;

use nokhwa::pixel_format::RgbAFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use crate::error::ControlError;

/// One captured frame, RGBA.
#[derive(Clone)]
pub struct Frame {
    /// RGBA pixel data
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Frame number
    pub frame_number: u64,
    /// Frame timestamp
    pub timestamp: Instant,
}

impl Frame {
    /// A black frame, used for the Off-state display.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; (width * height * 4) as usize],
            width,
            height,
            frame_number: 0,
            timestamp: Instant::now(),
        }
    }
}

/// A power-cyclable frame source.
pub trait FrameSource {
    /// Acquire the resource. Idempotent: opening an already-open source is
    /// a no-op.
    fn open(&mut self) -> Result<(), ControlError>;

    /// Read the next frame. Fails with `ReadFailed` when the source is
    /// closed or a single read goes wrong.
    fn read_frame(&mut self) -> Result<Frame, ControlError>;

    /// Release the resource. Safe to call when already closed.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Dimensions negotiated at the last successful acquisition, if any.
    fn dimensions(&self) -> Option<(u32, u32)>;
}

/// Camera frame source backed by nokhwa.
pub struct NokhwaFrameSource {
    index: u32,
    camera: Option<Camera>,
    dimensions: Option<(u32, u32)>,
    frame_count: u64,
}

impl NokhwaFrameSource {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            camera: None,
            dimensions: None,
            frame_count: 0,
        }
    }

    /// Open the camera, stepping down through format requests until one the
    /// device supports is found.
    fn open_camera(index: u32) -> Result<Camera, ControlError> {
        let camera_index = CameraIndex::Index(index);

        let requested =
            RequestedFormat::new::<RgbAFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let camera = match Camera::new(camera_index.clone(), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Failed to open camera with highest resolution: {:?}", e);

                let requested2 = RequestedFormat::new::<RgbAFormat>(
                    RequestedFormatType::HighestResolution(Resolution::new(640, 480)),
                );
                match Camera::new(camera_index.clone(), requested2) {
                    Ok(c) => c,
                    Err(e2) => {
                        log::warn!("Failed with HighestResolution: {:?}", e2);

                        let requested3 =
                            RequestedFormat::new::<RgbAFormat>(RequestedFormatType::None);
                        Camera::new(camera_index, requested3).map_err(|e3| {
                            ControlError::ResourceUnavailable(format!(
                                "cannot open camera {}: {}",
                                index, e3
                            ))
                        })?
                    }
                }
            }
        };

        Ok(camera)
    }
}

impl FrameSource for NokhwaFrameSource {
    fn open(&mut self) -> Result<(), ControlError> {
        if self.camera.is_some() {
            return Ok(());
        }

        let mut camera = Self::open_camera(self.index)?;
        camera
            .open_stream()
            .map_err(|e| ControlError::ResourceUnavailable(format!("cannot open stream: {}", e)))?;

        let resolution = camera.resolution();
        self.dimensions = Some((resolution.width(), resolution.height()));
        log::info!(
            "Camera opened: {} ({}x{})",
            camera.info().human_name(),
            resolution.width(),
            resolution.height()
        );

        self.camera = Some(camera);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, ControlError> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| ControlError::ReadFailed("camera is not open".to_string()))?;

        let buffer = camera
            .frame()
            .map_err(|e| ControlError::ReadFailed(e.to_string()))?;
        let image = buffer
            .decode_image::<RgbAFormat>()
            .map_err(|e| ControlError::ReadFailed(format!("decode failed: {}", e)))?;

        let width = buffer.resolution().width();
        let height = buffer.resolution().height();
        self.dimensions = Some((width, height));
        self.frame_count += 1;

        Ok(Frame {
            data: image.into_raw(),
            width,
            height,
            frame_number: self.frame_count,
            timestamp: Instant::now(),
        })
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream: {:?}", e);
            }
            log::info!("Camera released");
        }
    }

    fn is_open(&self) -> bool {
        self.camera.is_some()
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

impl Drop for NokhwaFrameSource {
    fn drop(&mut self) {
        self.close();
    }
}
