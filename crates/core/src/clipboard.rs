//! Clipboard content model and access.
//!
//! Platform clipboard APIs want to be driven from a thread with the right
//! apartment/ownership model, so [`SystemClipboard`] spins up a dedicated
//! thread per call, performs the operation there, and joins before
//! returning. Callers always get a synchronous result; failures map to
//! `None` (reads) or `false` (writes) and are logged, never propagated.

use std::borrow::Cow;
use std::thread;

use image::RgbaImage;

/// What the clipboard currently holds, as far as this overlay cares.
///
/// `TextNonPasteable` carries a human-readable description of payloads that
/// cannot be round-tripped (file lists); it is presentation-only and is
/// never written back to the clipboard.
#[derive(Debug, Clone)]
pub enum ClipboardContent {
    Text(String),
    TextNonPasteable(String),
    Image(RgbaImage),
}

impl ClipboardContent {
    /// Short label used by the content-type-only display mode.
    pub fn type_label(&self) -> &'static str {
        match self {
            ClipboardContent::Text(_) => "Text",
            ClipboardContent::TextNonPasteable(_) => "Files",
            ClipboardContent::Image(_) => "Image",
        }
    }
}

/// Clipboard capability injected into the orchestrator and the render
/// state provider.
pub trait ClipboardPort: Send + Sync {
    /// Reads the current clipboard contents. Never errors; an unavailable
    /// or empty clipboard is `None`.
    fn read(&self) -> Option<ClipboardContent>;

    /// Writes `Text` or `Image` content. Returns whether the write took.
    /// `TextNonPasteable` is refused.
    fn write(&self, content: &ClipboardContent) -> bool;
}

/// The real clipboard, backed by `arboard`.
pub struct SystemClipboard;

impl ClipboardPort for SystemClipboard {
    fn read(&self) -> Option<ClipboardContent> {
        let handle = thread::spawn(|| {
            let mut clipboard = arboard::Clipboard::new().ok()?;

            if let Ok(text) = clipboard.get_text() {
                return Some(ClipboardContent::Text(text));
            }

            if let Ok(img) = clipboard.get_image() {
                let image = RgbaImage::from_raw(
                    img.width as u32,
                    img.height as u32,
                    img.bytes.into_owned(),
                )?;
                return Some(ClipboardContent::Image(image));
            }

            if let Ok(files) = clipboard.get().file_list() {
                let listing = files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                return Some(ClipboardContent::TextNonPasteable(listing));
            }

            None
        });

        match handle.join() {
            Ok(content) => content,
            Err(_) => {
                log::warn!("clipboard read thread panicked");
                None
            }
        }
    }

    fn write(&self, content: &ClipboardContent) -> bool {
        let content = match content {
            ClipboardContent::TextNonPasteable(_) => {
                log::warn!("refusing to write non-pasteable content to clipboard");
                return false;
            }
            other => other.clone(),
        };

        let handle = thread::spawn(move || {
            let mut clipboard = match arboard::Clipboard::new() {
                Ok(c) => c,
                Err(e) => {
                    log::warn!("clipboard unavailable: {}", e);
                    return false;
                }
            };

            let outcome = match content {
                ClipboardContent::Text(text) => clipboard.set_text(text),
                ClipboardContent::Image(image) => {
                    let (width, height) = (image.width() as usize, image.height() as usize);
                    clipboard.set_image(arboard::ImageData {
                        width,
                        height,
                        bytes: Cow::Owned(image.into_raw()),
                    })
                }
                ClipboardContent::TextNonPasteable(_) => return false,
            };

            match outcome {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("clipboard write failed: {}", e);
                    false
                }
            }
        });

        handle.join().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_labels() {
        assert_eq!(ClipboardContent::Text(String::new()).type_label(), "Text");
        assert_eq!(
            ClipboardContent::TextNonPasteable(String::new()).type_label(),
            "Files"
        );
        assert_eq!(
            ClipboardContent::Image(RgbaImage::new(1, 1)).type_label(),
            "Image"
        );
    }
}
