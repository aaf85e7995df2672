//! Blocking run loops for the two controller variants
//!
//! Each app owns the full controller lifecycle (create, run, shutdown) and
//! ticks once per render interval: read a frame, hand it to the detection
//! pipeline, feed the latest result through the classifier and debounce
//! layer, and present. The quit key is observed once per tick.

use std::io::BufRead;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::capture::{ActionExecutor, CaptureController};
use crate::config::{ControlTiming, GestureThresholds};
use crate::detector::LandmarkDetector;
use crate::display::DisplaySink;
use crate::error::ControlError;
use crate::gesture::{classify_palm, classify_vertical, GestureLabel, LandmarkSet};
use crate::pipeline::DetectionPipeline;
use crate::power::PowerController;
use crate::source::{Frame, FrameSource};

/// Render loop pacing, roughly 30 ticks per second.
const RENDER_TICK: Duration = Duration::from_millis(33);

/// Cooperative stop signal, driven by the user typing `q` on stdin.
pub struct QuitSignal {
    rx: Receiver<()>,
}

impl QuitSignal {
    /// Spawn the stdin watcher thread.
    pub fn watch_stdin() -> Result<Self, ControlError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::Builder::new()
            .name("quit-watch".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                let mut lines = stdin.lock().lines();
                while let Some(Ok(line)) = lines.next() {
                    if line.trim().eq_ignore_ascii_case("q") {
                        let _ = tx.send(());
                        break;
                    }
                }
            })?;
        Ok(Self { rx })
    }

    /// Non-blocking check, called once per render tick.
    pub fn is_quit(&self) -> bool {
        self.rx.try_recv().is_ok()
    }

    #[cfg(test)]
    fn never() -> Self {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        Self { rx }
    }
}

fn first_hand_label<F>(result: Option<&[LandmarkSet]>, classify: F) -> GestureLabel
where
    F: Fn(&LandmarkSet) -> GestureLabel,
{
    result
        .and_then(|hands| hands.first())
        .map(classify)
        .unwrap_or(GestureLabel::None)
}

/// Thumbs up/down camera power control.
pub struct CameraControlApp<S: FrameSource, D: DisplaySink> {
    controller: PowerController<S>,
    pipeline: DetectionPipeline,
    display: D,
    thresholds: GestureThresholds,
    quit: QuitSignal,
}

impl<S: FrameSource, D: DisplaySink> CameraControlApp<S, D> {
    pub fn new(
        source: S,
        detector: Box<dyn LandmarkDetector>,
        display: D,
        timing: ControlTiming,
        thresholds: GestureThresholds,
    ) -> Result<Self, ControlError> {
        let controller = PowerController::new(source, &timing, Instant::now())?;
        let pipeline = DetectionPipeline::new(detector)?;
        let quit = QuitSignal::watch_stdin()?;

        Ok(Self {
            controller,
            pipeline,
            display,
            thresholds,
            quit,
        })
    }

    /// Run until the quit key. Per-tick errors stay in their tick; only
    /// startup failures (handled in `new`) terminate the process.
    pub fn run(&mut self) -> Result<(), ControlError> {
        log::info!("Thumbs UP to turn ON, Thumbs DOWN to turn OFF ('q' + Enter quits)");

        while !self.quit.is_quit() {
            let now = Instant::now();
            self.tick(now);
            std::thread::sleep(RENDER_TICK);
        }

        self.shutdown();
        Ok(())
    }

    fn tick(&mut self, now: Instant) {
        if self.controller.is_on() {
            match self.controller.read_frame() {
                Ok(frame) => {
                    self.pipeline.submit(frame.clone());
                    if let Some(result) = self.pipeline.latest_result() {
                        let label = first_hand_label(Some(result.hands.as_slice()), |hand| {
                            classify_vertical(hand, &self.thresholds)
                        });
                        self.controller.apply(label, now);
                    }
                    self.display.present(&frame, Some("Camera: ON"));
                }
                Err(e) => log::warn!("Failed to grab frame: {}", e),
            }
        } else {
            let detector = self.pipeline.detector();
            let thresholds = self.thresholds;
            self.controller.poll_off(now, move |frame| {
                let hands = detector.lock().detect(frame);
                first_hand_label(Some(hands.as_slice()), |hand| {
                    classify_vertical(hand, &thresholds)
                })
            });

            let (width, height) = self.controller.dimensions();
            self.display
                .present(&Frame::blank(width, height), Some("Camera: OFF"));
        }
    }

    fn shutdown(&mut self) {
        self.pipeline.stop();
        self.controller.shutdown();
    }
}

/// Open-palm screenshot capture.
pub struct PalmCaptureApp<S: FrameSource, E: ActionExecutor, D: DisplaySink> {
    source: S,
    pipeline: DetectionPipeline,
    capture: CaptureController<E>,
    display: D,
    thresholds: GestureThresholds,
    quit: QuitSignal,
}

impl<S: FrameSource, E: ActionExecutor, D: DisplaySink> PalmCaptureApp<S, E, D> {
    pub fn new(
        mut source: S,
        detector: Box<dyn LandmarkDetector>,
        executor: E,
        display: D,
        timing: ControlTiming,
        thresholds: GestureThresholds,
    ) -> Result<Self, ControlError> {
        source.open()?;
        let pipeline = DetectionPipeline::new(detector)?;
        let capture = CaptureController::new(executor, &timing);
        let quit = QuitSignal::watch_stdin()?;

        Ok(Self {
            source,
            pipeline,
            capture,
            display,
            thresholds,
            quit,
        })
    }

    pub fn run(&mut self) -> Result<(), ControlError> {
        log::info!("Show an open palm for 3 seconds to take a screenshot ('q' + Enter quits)");

        while !self.quit.is_quit() {
            let now = Instant::now();
            self.tick(now);
            std::thread::sleep(RENDER_TICK);
        }

        self.shutdown();
        Ok(())
    }

    fn tick(&mut self, now: Instant) {
        match self.source.read_frame() {
            Ok(frame) => {
                self.pipeline.submit(frame.clone());
                let result = self.pipeline.latest_result();
                let label = first_hand_label(result.as_ref().map(|r| r.hands.as_slice()), |hand| {
                    classify_palm(hand, &self.thresholds)
                });
                self.capture.update(label, &frame, now);
                self.display.present(&frame, self.capture.overlay());
                self.capture.render_tick();
            }
            Err(e) => log::warn!("Ignoring empty camera frame: {}", e),
        }
    }

    fn shutdown(&mut self) {
        self.pipeline.stop();
        self.source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{Landmark, LANDMARK_COUNT};
    use std::path::PathBuf;

    /// Source that serves blank frames while open.
    struct BlankSource {
        open: bool,
    }

    impl FrameSource for BlankSource {
        fn open(&mut self) -> Result<(), ControlError> {
            self.open = true;
            Ok(())
        }

        fn read_frame(&mut self) -> Result<Frame, ControlError> {
            if self.open {
                Ok(Frame::blank(640, 480))
            } else {
                Err(ControlError::ReadFailed("closed".to_string()))
            }
        }

        fn close(&mut self) {
            self.open = false;
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn dimensions(&self) -> Option<(u32, u32)> {
            Some((640, 480))
        }
    }

    /// Detector that always reports an open palm.
    struct PalmDetector;

    impl LandmarkDetector for PalmDetector {
        fn detect(&mut self, _frame: &Frame) -> Vec<LandmarkSet> {
            let mut points = [Landmark {
                x: 0.5,
                y: 0.7,
                z: 0.0,
            }; LANDMARK_COUNT];
            // Thumb near the wrist, four fingertips above it.
            points[4] = Landmark {
                x: 0.45,
                y: 0.6,
                z: 0.0,
            };
            for idx in [8, 12, 16, 20] {
                points[idx] = Landmark {
                    x: 0.5,
                    y: 0.4,
                    z: 0.0,
                };
            }
            vec![LandmarkSet::new(points)]
        }
    }

    struct CountingExecutor {
        calls: std::sync::Arc<std::sync::atomic::AtomicU32>,
    }

    impl ActionExecutor for CountingExecutor {
        fn capture_and_store(&mut self, _frame: &Frame) -> Result<PathBuf, ControlError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            Ok(PathBuf::from("/tmp/shot.png"))
        }
    }

    struct NullDisplay;

    impl DisplaySink for NullDisplay {
        fn present(&mut self, _frame: &Frame, _overlay: Option<&str>) {}
    }

    #[test]
    fn test_palm_capture_end_to_end_fires_once() {
        let timing = ControlTiming {
            min_hold: Duration::from_millis(50),
            ..ControlTiming::default()
        };
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        let pipeline = DetectionPipeline::new(Box::new(PalmDetector)).unwrap();
        let mut app = PalmCaptureApp {
            source: BlankSource { open: true },
            pipeline,
            capture: CaptureController::new(
                CountingExecutor {
                    calls: calls.clone(),
                },
                &timing,
            ),
            display: NullDisplay,
            thresholds: GestureThresholds::default(),
            quit: QuitSignal::never(),
        };

        // Drive ticks until the detection result lands and the hold gate
        // matures, well past the shortened minimum.
        let start = Instant::now();
        while Instant::now().duration_since(start) < Duration::from_millis(400) {
            app.tick(Instant::now());
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::Relaxed), 1);
        app.shutdown();
    }
}
