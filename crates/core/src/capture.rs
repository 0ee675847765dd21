//! Screen regions and capture.
//!
//! [`CaptureRegion`] is the normalized rectangle a completed drag resolves
//! to; [`ScreenCapturer`] grabs its pixels through the `screenshots` crate.
//! The capture side is abstracted behind [`RegionCapture`] so the
//! orchestrator can be exercised without a display server.

use crate::error::{AppError, Result};
use image::RgbaImage;
use screenshots::Screen;

/// A normalized screen rectangle in physical coordinates.
///
/// Built from two arbitrary corner points; the constructor takes the
/// componentwise min/max so `right >= left` and `bottom >= top` always hold.
/// A region with zero width or height is invalid and must be rejected
/// before any capture is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CaptureRegion {
    /// Builds a normalized region from two opposite corners, in any order.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Self {
            left: a.0.min(b.0),
            top: a.1.min(b.1),
            right: a.0.max(b.0),
            bottom: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top) as u32
    }

    /// True when the region has zero width or zero height.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Capture capability injected into the orchestrator.
pub trait RegionCapture: Send + Sync {
    /// Captures the pixels of `region`. Synchronous; physical coordinates.
    fn capture(&self, region: CaptureRegion) -> Result<RgbaImage>;
}

/// Region capturer backed by the detected screens.
///
/// Regions are expressed in virtual-desktop coordinates; the capturer
/// resolves which screen contains the region's top-left corner and
/// translates into that screen's local space.
pub struct ScreenCapturer {
    screens: Vec<Screen>,
}

impl ScreenCapturer {
    /// Initializes the capturer by detecting available screens.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ScreenCapture`] if screen enumeration fails
    /// (e.g., no display server available) or no screens are detected.
    pub fn new() -> Result<Self> {
        let screens = Screen::all()
            .map_err(|e| AppError::capture(format!("Failed to enumerate screens: {}", e)))?;

        if screens.is_empty() {
            return Err(AppError::capture("No screens detected"));
        }

        Ok(Self { screens })
    }

    /// Returns the number of available screens.
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    fn screen_containing(&self, x: i32, y: i32) -> Option<&Screen> {
        self.screens.iter().find(|s| {
            let info = s.display_info;
            x >= info.x
                && y >= info.y
                && x < info.x + info.width as i32
                && y < info.y + info.height as i32
        })
    }
}

impl RegionCapture for ScreenCapturer {
    fn capture(&self, region: CaptureRegion) -> Result<RgbaImage> {
        if region.is_empty() {
            return Err(AppError::EmptyRegion);
        }

        let screen = self
            .screen_containing(region.left, region.top)
            .ok_or_else(|| {
                AppError::RegionOffScreen(format!("({}, {})", region.left, region.top))
            })?;
        let info = screen.display_info;

        let captured = screen
            .capture_area(
                region.left - info.x,
                region.top - info.y,
                region.width(),
                region.height(),
            )
            .map_err(|e| AppError::capture(format!("Failed to capture region: {}", e)))?;

        // Convert screenshots::Image to image::RgbaImage
        let width = captured.width();
        let height = captured.height();
        let rgba_data = captured.into_raw();

        RgbaImage::from_raw(width, height, rgba_data)
            .ok_or_else(|| AppError::capture("Failed to create image buffer"))
    }
}
