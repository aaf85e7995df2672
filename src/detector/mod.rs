//! Hand landmark detection
//!
//! Runs a MediaPipe-style 21-landmark hand model via ONNX Runtime. The
//! detector is stateless per call from the control layer's perspective: one
//! frame in, zero or more landmark sets out. Inference errors are logged
//! and mapped to an empty detection so a bad frame never stalls the loop.

use std::path::PathBuf;

use ndarray::Array4;

use crate::error::ControlError;
use crate::gesture::{Landmark, LandmarkSet, LANDMARK_COUNT};
use crate::source::Frame;

/// Model input edge length in pixels.
const INPUT_SIZE: u32 = 224;

/// Minimum landmark-presence score for a detection to count.
const MIN_CONFIDENCE: f32 = 0.7;

/// External landmark detector interface.
pub trait LandmarkDetector: Send {
    /// Detect hands in a frame. Possibly empty; never blocks the caller on
    /// anything other than the inference itself.
    fn detect(&mut self, frame: &Frame) -> Vec<LandmarkSet>;
}

/// Hand landmark detector backed by ONNX Runtime.
pub struct OnnxHandDetector {
    session: ort::session::Session,
    min_confidence: f32,
}

impl OnnxHandDetector {
    /// Load the hand landmark model from the models directory.
    pub fn new() -> Result<Self, ControlError> {
        let model_dir = Self::find_model_dir()?;
        let model_path = model_dir.join("hand_landmark.onnx");
        if !model_path.exists() {
            return Err(ControlError::ResourceUnavailable(format!(
                "hand landmark model not found: {:?}",
                model_path
            )));
        }

        ort::init().with_name("GestureCamera").commit();

        let session = ort::session::Session::builder()
            .map_err(|e| {
                ControlError::ResourceUnavailable(format!("failed to create session: {}", e))
            })?
            .with_intra_threads(2)
            .map_err(|e| ControlError::ResourceUnavailable(format!("failed to set threads: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| {
                ControlError::ResourceUnavailable(format!("failed to load model: {}", e))
            })?;

        log::info!("Loaded hand landmark model from {:?}", model_path);

        Ok(Self {
            session,
            min_confidence: MIN_CONFIDENCE,
        })
    }

    /// Find the models directory, relative to the executable or the current
    /// directory.
    fn find_model_dir() -> Result<PathBuf, ControlError> {
        if let Ok(exe_path) = std::env::current_exe() {
            let mut dir = exe_path.parent().map(PathBuf::from);
            while let Some(parent) = dir {
                let model_dir = parent.join("models");
                if model_dir.exists() {
                    return Ok(model_dir);
                }
                dir = parent.parent().map(PathBuf::from);
            }
        }

        let cwd = std::env::current_dir().map_err(ControlError::Io)?;
        let model_dir = cwd.join("models");
        if model_dir.exists() {
            return Ok(model_dir);
        }

        Err(ControlError::ResourceUnavailable(
            "models directory not found; create 'models' with hand_landmark.onnx".to_string(),
        ))
    }

    /// Resize to the model input and convert RGBA to RGB float [0, 1] in
    /// NHWC layout.
    fn preprocess_nhwc(frame: &Frame, target_width: u32, target_height: u32) -> Vec<f32> {
        let mut output = vec![0.0f32; (target_width * target_height * 3) as usize];

        let x_ratio = frame.width as f32 / target_width as f32;
        let y_ratio = frame.height as f32 / target_height as f32;

        for y in 0..target_height {
            for x in 0..target_width {
                let src_x = (x as f32 * x_ratio) as u32;
                let src_y = (y as f32 * y_ratio) as u32;
                let src_idx = ((src_y * frame.width + src_x) * 4) as usize;

                if src_idx + 2 < frame.data.len() {
                    let out_idx = ((y * target_width + x) * 3) as usize;
                    output[out_idx] = frame.data[src_idx] as f32 / 255.0;
                    output[out_idx + 1] = frame.data[src_idx + 1] as f32 / 255.0;
                    output[out_idx + 2] = frame.data[src_idx + 2] as f32 / 255.0;
                }
            }
        }

        output
    }

    fn run_landmarks(&mut self, frame: &Frame) -> Result<Vec<LandmarkSet>, String> {
        let input = Self::preprocess_nhwc(frame, INPUT_SIZE, INPUT_SIZE);

        let input_array = Array4::from_shape_vec(
            (1, INPUT_SIZE as usize, INPUT_SIZE as usize, 3),
            input,
        )
        .map_err(|e| format!("failed to create input array: {}", e))?;

        let input_tensor = ort::value::Tensor::from_array(input_array)
            .map_err(|e| format!("failed to create tensor: {}", e))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| format!("inference failed: {}", e))?;

        let mut output_iter = outputs.iter();

        // First output: 63 floats (21 landmarks, x/y/z in input-pixel space).
        let landmark_output = output_iter.next().ok_or("no landmark output")?;
        let (_shape, coords) = landmark_output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| format!("failed to extract landmarks: {}", e))?;

        // Second output: hand-presence score.
        let score = output_iter
            .next()
            .and_then(|output| {
                output
                    .1
                    .try_extract_tensor::<f32>()
                    .ok()
                    .and_then(|(_, data)| data.first().copied())
            })
            .unwrap_or(1.0);

        if score < self.min_confidence {
            return Ok(Vec::new());
        }

        if coords.len() < LANDMARK_COUNT * 3 {
            return Err(format!("unexpected landmark output length {}", coords.len()));
        }

        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for (i, point) in points.iter_mut().enumerate() {
            *point = Landmark {
                x: coords[i * 3] / INPUT_SIZE as f32,
                y: coords[i * 3 + 1] / INPUT_SIZE as f32,
                z: coords[i * 3 + 2] / INPUT_SIZE as f32,
            };
        }

        Ok(vec![LandmarkSet::new(points)])
    }
}

impl LandmarkDetector for OnnxHandDetector {
    fn detect(&mut self, frame: &Frame) -> Vec<LandmarkSet> {
        match self.run_landmarks(frame) {
            Ok(hands) => hands,
            Err(e) => {
                log::warn!("Hand inference failed: {}", e);
                Vec::new()
            }
        }
    }
}
