//! Detection pipeline
//!
//! Single-slot frame handoff between the capture/render loop and an
//! out-of-band detection thread. The slot holds at most one frame: newer
//! frames overwrite unread ones, the capture side never blocks on
//! detection, and the busy flag guarantees no more than one frame is in
//! flight through the detector at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::detector::LandmarkDetector;
use crate::error::ControlError;
use crate::gesture::LandmarkSet;
use crate::source::Frame;

/// How long the detection thread sleeps when no new frame is waiting.
const IDLE_SLEEP: Duration = Duration::from_millis(2);

/// A completed detection, possibly one or more capture cycles stale. That
/// is acceptable: gesture intent persists across many frames, and the
/// debounce windows are measured in whole seconds.
#[derive(Clone)]
pub struct DetectionResult {
    /// Detected hands (possibly empty)
    pub hands: Vec<LandmarkSet>,
    /// Frame number the result corresponds to
    pub frame_number: u64,
}

/// The shared single-slot handoff: latest frame, latest result, busy flag.
pub struct SharedFrameSlot {
    inner: Mutex<SlotInner>,
    busy: AtomicBool,
}

struct SlotInner {
    frame: Option<Frame>,
    result: Option<DetectionResult>,
}

impl SharedFrameSlot {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                frame: None,
                result: None,
            }),
            busy: AtomicBool::new(false),
        }
    }

    /// Publish the newest frame, overwriting any unread one. Never blocks
    /// on detection.
    pub fn publish_frame(&self, frame: Frame) {
        self.inner.lock().frame = Some(frame);
    }

    /// Most recently completed detection, if any.
    pub fn latest_result(&self) -> Option<DetectionResult> {
        self.inner.lock().result.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the pending frame for processing. Returns None when nothing
    /// new is waiting or a detection is already in flight.
    fn begin_processing(&self) -> Option<Frame> {
        if self.busy.swap(true, Ordering::Acquire) {
            return None;
        }
        let frame = self.inner.lock().frame.take();
        if frame.is_none() {
            self.busy.store(false, Ordering::Release);
        }
        frame
    }

    /// Publish a completed detection and clear the busy flag.
    fn finish_processing(&self, result: DetectionResult) {
        self.inner.lock().result = Some(result);
        self.busy.store(false, Ordering::Release);
    }
}

impl Default for SharedFrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the detection thread and the shared slot.
pub struct DetectionPipeline {
    slot: Arc<SharedFrameSlot>,
    detector: Arc<Mutex<Box<dyn LandmarkDetector>>>,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl DetectionPipeline {
    pub fn new(detector: Box<dyn LandmarkDetector>) -> Result<Self, ControlError> {
        let slot = Arc::new(SharedFrameSlot::new());
        let detector = Arc::new(Mutex::new(detector));
        let running = Arc::new(AtomicBool::new(true));

        let slot_clone = slot.clone();
        let detector_clone = detector.clone();
        let running_clone = running.clone();

        let thread_handle = std::thread::Builder::new()
            .name("gesture-detect".to_string())
            .spawn(move || {
                Self::detection_thread(slot_clone, detector_clone, running_clone);
            })?;

        Ok(Self {
            slot,
            detector,
            running,
            thread_handle: Some(thread_handle),
        })
    }

    fn detection_thread(
        slot: Arc<SharedFrameSlot>,
        detector: Arc<Mutex<Box<dyn LandmarkDetector>>>,
        running: Arc<AtomicBool>,
    ) {
        log::info!("Detection thread started");

        while running.load(Ordering::Acquire) {
            match slot.begin_processing() {
                Some(frame) => {
                    let hands = detector.lock().detect(&frame);
                    slot.finish_processing(DetectionResult {
                        hands,
                        frame_number: frame.frame_number,
                    });
                }
                None => {
                    // Nothing new; idle rather than reprocessing.
                    std::thread::sleep(IDLE_SLEEP);
                }
            }
        }

        log::info!("Detection thread stopped");
    }

    /// Hand the newest frame to the detection thread (non-blocking).
    pub fn submit(&self, frame: Frame) {
        self.slot.publish_frame(frame);
    }

    /// Most recently completed detection, if any.
    pub fn latest_result(&self) -> Option<DetectionResult> {
        self.slot.latest_result()
    }

    /// Shared detector handle, used by the Off-state peek path to classify
    /// a single frame synchronously while the pipeline is idle.
    pub fn detector(&self) -> Arc<Mutex<Box<dyn LandmarkDetector>>> {
        self.detector.clone()
    }

    /// Stop the detection thread and join it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DetectionPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{Landmark, LANDMARK_COUNT};
    use std::time::Instant;

    fn frame(number: u64) -> Frame {
        Frame {
            data: vec![0u8; 16],
            width: 2,
            height: 2,
            frame_number: number,
            timestamp: Instant::now(),
        }
    }

    /// Detector that tags each result with the frame number it saw.
    struct EchoDetector;

    impl LandmarkDetector for EchoDetector {
        fn detect(&mut self, _frame: &Frame) -> Vec<LandmarkSet> {
            vec![LandmarkSet::new([Landmark::default(); LANDMARK_COUNT])]
        }
    }

    #[test]
    fn test_newest_frame_wins() {
        let slot = SharedFrameSlot::new();
        slot.publish_frame(frame(1));
        slot.publish_frame(frame(2));

        let claimed = slot.begin_processing().expect("frame available");
        assert_eq!(claimed.frame_number, 2);
        // The older frame was overwritten, not queued.
        slot.finish_processing(DetectionResult {
            hands: Vec::new(),
            frame_number: claimed.frame_number,
        });
        assert!(slot.begin_processing().is_none());
    }

    #[test]
    fn test_busy_flag_prevents_double_processing() {
        let slot = SharedFrameSlot::new();
        slot.publish_frame(frame(1));

        let first = slot.begin_processing();
        assert!(first.is_some());
        assert!(slot.is_busy());

        // A second claim while busy must fail even if a new frame arrived.
        slot.publish_frame(frame(2));
        assert!(slot.begin_processing().is_none());

        slot.finish_processing(DetectionResult {
            hands: Vec::new(),
            frame_number: 1,
        });
        assert!(!slot.is_busy());
        assert_eq!(slot.begin_processing().unwrap().frame_number, 2);
    }

    #[test]
    fn test_empty_slot_does_not_stay_busy() {
        let slot = SharedFrameSlot::new();
        assert!(slot.begin_processing().is_none());
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_pipeline_publishes_results() {
        let mut pipeline = DetectionPipeline::new(Box::new(EchoDetector)).unwrap();
        pipeline.submit(frame(7));

        // Wait for the worker to pick the frame up and publish.
        let deadline = Instant::now() + Duration::from_secs(2);
        let result = loop {
            if let Some(result) = pipeline.latest_result() {
                break result;
            }
            assert!(Instant::now() < deadline, "detection result never arrived");
            std::thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(result.frame_number, 7);
        assert_eq!(result.hands.len(), 1);

        pipeline.stop();
    }

    #[test]
    fn test_stop_joins_worker() {
        let mut pipeline = DetectionPipeline::new(Box::new(EchoDetector)).unwrap();
        pipeline.stop();
        // Stopping twice is harmless.
        pipeline.stop();
    }
}
