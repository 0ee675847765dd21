//! Capture orchestration.
//!
//! Turns completed drag gestures into their side effects: a primary drag
//! copies the selected region to the clipboard as an image; a secondary
//! drag sends it through OCR and copies the recognized text. The overlay
//! must never capture itself, so the hide → capture → show window runs
//! under the render lock shared with the frame loop.
//!
//! Nothing here may crash or wedge the overlay: every adapter failure
//! degrades to a logged no-op for that gesture, and the OCR round trip
//! runs on its own worker thread so gesture processing never waits on the
//! network.

use crate::capture::{CaptureRegion, RegionCapture};
use crate::clipboard::{ClipboardContent, ClipboardPort};
use crate::image_processing::ImageProcessor;
use crate::input::PointerEvent;
use crate::lock_unpoisoned;
use crate::ocr::TextRecognizer;
use crate::tracker::CompletedDrags;
use image::RgbaImage;
use std::sync::{Arc, Mutex};
use std::thread;

/// Lifecycle of the most recent OCR job.
///
/// Written by the orchestrator, read by the render state provider. The
/// whole cell transitions under one lock so readers see state and payload
/// together. Transitions are totally ordered:
/// Idle → Running → Completed | Failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OcrJobState {
    #[default]
    Idle,
    Running,
    Completed(String),
    Failed(String),
}

impl OcrJobState {
    /// The busy indicator shown by the overlay spinner.
    pub fn is_running(&self) -> bool {
        matches!(self, OcrJobState::Running)
    }
}

/// Overlay visibility control used around screen captures.
pub trait OverlayControl: Send + Sync {
    fn hide(&self);
    fn show(&self);
}

/// Sequences the side effects of completed gestures.
pub struct CaptureOrchestrator {
    capturer: Arc<dyn RegionCapture>,
    clipboard: Arc<dyn ClipboardPort>,
    overlay: Arc<dyn OverlayControl>,
    recognizer: Arc<dyn TextRecognizer>,
    render_lock: Arc<Mutex<()>>,
    ocr_job: Arc<Mutex<OcrJobState>>,
}

impl CaptureOrchestrator {
    pub fn new(
        capturer: Arc<dyn RegionCapture>,
        clipboard: Arc<dyn ClipboardPort>,
        overlay: Arc<dyn OverlayControl>,
        recognizer: Arc<dyn TextRecognizer>,
        render_lock: Arc<Mutex<()>>,
        ocr_job: Arc<Mutex<OcrJobState>>,
    ) -> Self {
        Self {
            capturer,
            clipboard,
            overlay,
            recognizer,
            render_lock,
            ocr_job,
        }
    }

    /// Dispatches whatever the tracker reported as complete.
    pub fn handle_completed(&self, drags: CompletedDrags) {
        if let Some((start, end)) = drags.primary {
            self.complete_primary(&start, &end);
        }
        if let Some((start, end)) = drags.secondary {
            self.complete_secondary(&start, &end);
        }
    }

    /// A finished primary drag: capture the region and put the image on
    /// the clipboard.
    pub fn complete_primary(&self, start: &PointerEvent, end: &PointerEvent) {
        let region = CaptureRegion::from_corners((start.x, start.y), (end.x, end.y));
        if region.is_empty() {
            log::debug!("dropping empty primary selection");
            return;
        }

        let Some(image) = self.capture_hidden(region) else {
            return;
        };

        if !self.clipboard.write(&ClipboardContent::Image(image)) {
            log::warn!("captured image was not written to the clipboard");
        }
    }

    /// A finished secondary drag: capture the region, recognize its text on
    /// a worker thread, and put the result on the clipboard.
    pub fn complete_secondary(&self, start: &PointerEvent, end: &PointerEvent) {
        let region = CaptureRegion::from_corners((start.x, start.y), (end.x, end.y));
        if region.is_empty() {
            log::debug!("dropping empty secondary selection");
            return;
        }

        let Some(image) = self.capture_hidden(region) else {
            return;
        };

        // Flip the busy indicator before the upload is even scheduled.
        self.set_job(OcrJobState::Running);

        let recognizer = Arc::clone(&self.recognizer);
        let clipboard = Arc::clone(&self.clipboard);
        let ocr_job = Arc::clone(&self.ocr_job);

        thread::spawn(move || {
            let png = match ImageProcessor::encode_png(&image) {
                Ok(png) => png,
                Err(e) => {
                    log::warn!("failed to encode capture for OCR: {}", e);
                    *lock_unpoisoned(&ocr_job) = OcrJobState::Failed(e.to_string());
                    return;
                }
            };

            match recognizer.recognize(&png, "capture.png", "image/png") {
                Ok(text) => {
                    *lock_unpoisoned(&ocr_job) = OcrJobState::Completed(text.clone());
                    if !clipboard.write(&ClipboardContent::Text(text)) {
                        log::warn!("recognized text was not written to the clipboard");
                    }
                }
                Err(e) => {
                    log::warn!("OCR failed: {}", e);
                    *lock_unpoisoned(&ocr_job) = OcrJobState::Failed(e.to_string());
                }
            }
        });
    }

    /// Hides the overlay, captures, and shows it again, all under the
    /// render lock so no frame is drawn into the captured pixels.
    fn capture_hidden(&self, region: CaptureRegion) -> Option<RgbaImage> {
        let _guard = lock_unpoisoned(&self.render_lock);

        self.overlay.hide();
        let result = self.capturer.capture(region);
        self.overlay.show();

        match result {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("screen capture failed: {}", e);
                None
            }
        }
    }

    fn set_job(&self, state: OcrJobState) {
        *lock_unpoisoned(&self.ocr_job) = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::input::PointerKind;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::time::{Duration, Instant, SystemTime};

    fn event(x: i32, y: i32, millis: u64) -> PointerEvent {
        PointerEvent {
            kind: PointerKind::Move,
            x,
            y,
            delta: 0,
            timestamp: SystemTime::UNIX_EPOCH + Duration::from_millis(millis),
        }
    }

    type OpLog = Arc<Mutex<Vec<&'static str>>>;

    struct MockOverlay {
        ops: OpLog,
    }

    impl OverlayControl for MockOverlay {
        fn hide(&self) {
            self.ops.lock().unwrap().push("hide");
        }
        fn show(&self) {
            self.ops.lock().unwrap().push("show");
        }
    }

    struct MockCapturer {
        ops: OpLog,
        render_lock: Arc<Mutex<()>>,
        lock_was_held: Arc<AtomicBool>,
        fail: bool,
    }

    impl RegionCapture for MockCapturer {
        fn capture(&self, region: CaptureRegion) -> crate::error::Result<RgbaImage> {
            self.ops.lock().unwrap().push("capture");
            if self.render_lock.try_lock().is_err() {
                self.lock_was_held.store(true, Ordering::SeqCst);
            }
            if self.fail {
                return Err(AppError::capture("mock failure"));
            }
            Ok(RgbaImage::new(region.width(), region.height()))
        }
    }

    #[derive(Default)]
    struct MockClipboard {
        writes: Mutex<Vec<ClipboardContent>>,
        reject: bool,
    }

    impl ClipboardPort for MockClipboard {
        fn read(&self) -> Option<ClipboardContent> {
            None
        }
        fn write(&self, content: &ClipboardContent) -> bool {
            self.writes.lock().unwrap().push(content.clone());
            !self.reject
        }
    }

    /// Recognizer that waits for a release signal before answering, so
    /// tests can observe the Running state.
    struct GatedRecognizer {
        release: Mutex<Receiver<()>>,
        result: crate::error::Result<String>,
    }

    impl GatedRecognizer {
        fn succeeding(text: &str) -> (Arc<Self>, Sender<()>) {
            let (tx, rx) = channel();
            let recognizer = Arc::new(Self {
                release: Mutex::new(rx),
                result: Ok(text.to_string()),
            });
            (recognizer, tx)
        }

        fn failing(message: &str) -> (Arc<Self>, Sender<()>) {
            let (tx, rx) = channel();
            let recognizer = Arc::new(Self {
                release: Mutex::new(rx),
                result: Err(AppError::ocr(message.to_string())),
            });
            (recognizer, tx)
        }
    }

    impl TextRecognizer for GatedRecognizer {
        fn recognize(&self, _png: &[u8], _filename: &str, _mime: &str) -> crate::error::Result<String> {
            let _ = self.release.lock().unwrap().recv();
            match &self.result {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(AppError::ocr(e.to_string())),
            }
        }
    }

    struct Harness {
        orchestrator: CaptureOrchestrator,
        ops: OpLog,
        writes: Arc<MockClipboard>,
        job: Arc<Mutex<OcrJobState>>,
        lock_was_held: Arc<AtomicBool>,
    }

    fn harness(recognizer: Arc<dyn TextRecognizer>, capture_fails: bool) -> Harness {
        let ops: OpLog = Arc::new(Mutex::new(Vec::new()));
        let render_lock = Arc::new(Mutex::new(()));
        let job = Arc::new(Mutex::new(OcrJobState::Idle));
        let lock_was_held = Arc::new(AtomicBool::new(false));
        let clipboard = Arc::new(MockClipboard::default());

        let orchestrator = CaptureOrchestrator::new(
            Arc::new(MockCapturer {
                ops: Arc::clone(&ops),
                render_lock: Arc::clone(&render_lock),
                lock_was_held: Arc::clone(&lock_was_held),
                fail: capture_fails,
            }),
            Arc::clone(&clipboard) as Arc<dyn ClipboardPort>,
            Arc::new(MockOverlay {
                ops: Arc::clone(&ops),
            }),
            recognizer,
            render_lock,
            Arc::clone(&job),
        );

        Harness {
            orchestrator,
            ops,
            writes: clipboard,
            job,
            lock_was_held,
        }
    }

    fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn primary_hides_captures_shows_in_order_and_writes_image() {
        let (recognizer, _tx) = GatedRecognizer::succeeding("");
        let h = harness(recognizer, false);

        h.orchestrator.complete_primary(&event(10, 10, 1), &event(60, 90, 2));

        assert_eq!(*h.ops.lock().unwrap(), vec!["hide", "capture", "show"]);
        assert!(h.lock_was_held.load(Ordering::SeqCst));

        let writes = h.writes.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        match &writes[0] {
            ClipboardContent::Image(image) => {
                assert_eq!((image.width(), image.height()), (50, 80));
            }
            other => panic!("expected image write, got {:?}", other),
        }
    }

    #[test]
    fn zero_area_primary_touches_no_adapters() {
        let (recognizer, _tx) = GatedRecognizer::succeeding("");
        let h = harness(recognizer, false);

        h.orchestrator.complete_primary(&event(10, 10, 1), &event(10, 90, 2));

        assert!(h.ops.lock().unwrap().is_empty());
        assert!(h.writes.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn capture_failure_still_restores_overlay_and_writes_nothing() {
        let (recognizer, _tx) = GatedRecognizer::succeeding("");
        let h = harness(recognizer, true);

        h.orchestrator.complete_primary(&event(0, 0, 1), &event(5, 5, 2));

        assert_eq!(*h.ops.lock().unwrap(), vec!["hide", "capture", "show"]);
        assert!(h.writes.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn secondary_success_transitions_in_order_and_writes_text_once() {
        let (recognizer, release) = GatedRecognizer::succeeding("HELLO");
        let h = harness(recognizer, false);

        assert_eq!(*h.job.lock().unwrap(), OcrJobState::Idle);

        h.orchestrator.complete_secondary(&event(0, 0, 1), &event(40, 40, 2));

        // Busy flag is up before the recognizer has answered.
        assert!(h.job.lock().unwrap().is_running());
        assert_eq!(*h.ops.lock().unwrap(), vec!["hide", "capture", "show"]);

        release.send(()).unwrap();

        assert!(wait_until(Duration::from_secs(2), || {
            matches!(*h.job.lock().unwrap(), OcrJobState::Completed(_))
        }));
        assert!(wait_until(Duration::from_secs(2), || {
            h.writes.writes.lock().unwrap().len() == 1
        }));

        match &*h.job.lock().unwrap() {
            OcrJobState::Completed(text) => assert_eq!(text, "HELLO"),
            other => panic!("expected completion, got {:?}", other),
        }
        match &h.writes.writes.lock().unwrap()[0] {
            ClipboardContent::Text(text) => assert_eq!(text, "HELLO"),
            other => panic!("expected text write, got {:?}", other),
        }
    }

    #[test]
    fn secondary_failure_writes_nothing_and_ends_failed() {
        let (recognizer, release) = GatedRecognizer::failing("service down");
        let h = harness(recognizer, false);

        h.orchestrator.complete_secondary(&event(0, 0, 1), &event(40, 40, 2));
        assert!(h.job.lock().unwrap().is_running());
        release.send(()).unwrap();

        assert!(wait_until(Duration::from_secs(2), || {
            matches!(*h.job.lock().unwrap(), OcrJobState::Failed(_))
        }));
        assert!(h.writes.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_area_secondary_never_starts_a_job() {
        let (recognizer, _tx) = GatedRecognizer::succeeding("HELLO");
        let h = harness(recognizer, false);

        h.orchestrator.complete_secondary(&event(7, 3, 1), &event(7, 3, 2));

        assert!(h.ops.lock().unwrap().is_empty());
        assert_eq!(*h.job.lock().unwrap(), OcrJobState::Idle);
    }

    #[test]
    fn handle_completed_routes_both_buttons() {
        let (recognizer, release) = GatedRecognizer::succeeding("TEXT");
        let h = harness(recognizer, false);

        h.orchestrator.handle_completed(CompletedDrags {
            primary: Some((event(0, 0, 1), event(10, 10, 2))),
            secondary: Some((event(5, 5, 3), event(25, 25, 4))),
        });
        release.send(()).unwrap();

        assert_eq!(
            *h.ops.lock().unwrap(),
            vec!["hide", "capture", "show", "hide", "capture", "show"]
        );
        assert!(wait_until(Duration::from_secs(2), || {
            h.writes.writes.lock().unwrap().len() == 2
        }));
    }

    #[test]
    fn rejected_clipboard_write_is_swallowed() {
        let (recognizer, _tx) = GatedRecognizer::succeeding("");
        let mut h = harness(recognizer, false);
        // Swap in a clipboard that refuses writes.
        let clipboard = Arc::new(MockClipboard {
            writes: Mutex::new(Vec::new()),
            reject: true,
        });
        h.orchestrator.clipboard = Arc::clone(&clipboard) as Arc<dyn ClipboardPort>;

        h.orchestrator.complete_primary(&event(0, 0, 1), &event(4, 4, 2));
        assert_eq!(clipboard.writes.lock().unwrap().len(), 1);
    }
}
