//! Read-side aggregation for the overlay.
//!
//! Once per frame the renderer asks [`RenderStateProvider`] for a
//! [`RenderSnapshot`]: the clipboard preview (read fresh, since the
//! clipboard can change under us at any time), the in-progress drag
//! rectangles, and the OCR busy indicator. The provider mutates nothing in
//! the tracker or the job cell; its only private state is the preview
//! cache and the spinner angle.

use crate::clipboard::{ClipboardContent, ClipboardPort};
use crate::config::DisplayMode;
use crate::image_processing::{ImageFingerprint, ImageProcessor};
use crate::lock_unpoisoned;
use crate::orchestrator::OcrJobState;
use crate::tracker::{DragRect, DragTracker};
use image::RgbaImage;
use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};

/// Radians the spinner advances per frame while OCR is in flight.
const SPINNER_STEP: f32 = 0.25;

/// Clipboard content prepared for painting.
#[derive(Debug, Clone)]
pub enum PreviewContent {
    Text(String),
    TextNonPasteable(String),
    Image {
        image: Arc<RgbaImage>,
        fingerprint: ImageFingerprint,
    },
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    pub clipboard: Option<PreviewContent>,
    pub primary_drag: Option<DragRect>,
    pub secondary_drag: Option<DragRect>,
    pub ocr_busy: bool,
    /// Spinner phase, advanced once per frame while `ocr_busy`, mod 2π.
    pub rotation_angle: f32,
    /// Last pointer position from the hook stream; anchors the preview.
    pub cursor: Option<(i32, i32)>,
}

struct CachedPreview {
    fingerprint: ImageFingerprint,
    image: Arc<RgbaImage>,
}

/// Aggregates tracker, job, and clipboard state into per-frame snapshots.
pub struct RenderStateProvider {
    tracker: Arc<Mutex<DragTracker>>,
    ocr_job: Arc<Mutex<OcrJobState>>,
    clipboard: Arc<dyn ClipboardPort>,
    render_lock: Arc<Mutex<()>>,
    display_mode: DisplayMode,
    preview_scale: f32,
    cache: Mutex<Option<CachedPreview>>,
    rotation: Mutex<f32>,
}

impl RenderStateProvider {
    pub fn new(
        tracker: Arc<Mutex<DragTracker>>,
        ocr_job: Arc<Mutex<OcrJobState>>,
        clipboard: Arc<dyn ClipboardPort>,
        render_lock: Arc<Mutex<()>>,
        display_mode: DisplayMode,
        preview_scale: f32,
    ) -> Self {
        Self {
            tracker,
            ocr_job,
            clipboard,
            render_lock,
            display_mode,
            preview_scale,
            cache: Mutex::new(None),
            rotation: Mutex::new(0.0),
        }
    }

    /// Produces one frame's snapshot.
    ///
    /// Serializes against the capture window: while the orchestrator holds
    /// the render lock for hide → capture → show, this call waits, so no
    /// snapshot is ever produced between hide and show.
    pub fn snapshot(&self) -> RenderSnapshot {
        let _guard = lock_unpoisoned(&self.render_lock);

        let (primary_drag, secondary_drag, cursor) = {
            let tracker = lock_unpoisoned(&self.tracker);
            let (primary, secondary) = tracker.in_progress();
            (primary, secondary, tracker.last_position())
        };
        let ocr_busy = lock_unpoisoned(&self.ocr_job).is_running();

        let rotation_angle = {
            let mut angle = lock_unpoisoned(&self.rotation);
            if ocr_busy {
                *angle = (*angle + SPINNER_STEP) % TAU;
            }
            *angle
        };

        RenderSnapshot {
            clipboard: self.preview(),
            primary_drag,
            secondary_drag,
            ocr_busy,
            rotation_angle,
            cursor,
        }
    }

    /// Reads the clipboard and maps it through the display mode.
    fn preview(&self) -> Option<PreviewContent> {
        match self.display_mode {
            DisplayMode::Off => None,
            DisplayMode::ContentType => self
                .clipboard
                .read()
                .map(|content| PreviewContent::Text(content.type_label().to_string())),
            DisplayMode::Content => match self.clipboard.read()? {
                ClipboardContent::Text(text) => Some(PreviewContent::Text(text)),
                ClipboardContent::TextNonPasteable(text) => {
                    Some(PreviewContent::TextNonPasteable(text))
                }
                ClipboardContent::Image(image) => Some(self.image_preview(&image)),
            },
        }
    }

    /// Downscales a clipboard image, reusing the cached result while the
    /// content fingerprint is unchanged.
    fn image_preview(&self, image: &RgbaImage) -> PreviewContent {
        let fingerprint = ImageProcessor::fingerprint(image);

        let mut cache = lock_unpoisoned(&self.cache);
        let hit = cache
            .as_ref()
            .filter(|entry| entry.fingerprint == fingerprint)
            .map(|entry| Arc::clone(&entry.image));

        let scaled = match hit {
            Some(image) => image,
            None => {
                let scaled = Arc::new(ImageProcessor::downscale_preview(
                    image,
                    self.preview_scale,
                ));
                *cache = Some(CachedPreview {
                    fingerprint,
                    image: Arc::clone(&scaled),
                });
                scaled
            }
        };

        PreviewContent::Image {
            image: scaled,
            fingerprint,
        }
    }
}
