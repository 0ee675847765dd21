//! CLIPLENS Core Library
//!
//! This library provides the core functionality for the cliplens overlay
//! tool: a transparent always-on-top window that previews the current
//! clipboard near the cursor, plus modifier-gated drag gestures that copy
//! a screen region to the clipboard — as an image (left drag) or as OCR'd
//! text (right drag).
//!
//! # Overview
//!
//! The library is built around three cooperating pieces:
//!
//! - **Drag Tracking**: the [`tracker`] module turns the global mouse
//!   stream into completed gestures, gated by held modifier keys
//! - **Capture Orchestration**: the [`orchestrator`] module sequences
//!   hide → capture → show around screen grabs and drives the OCR round
//!   trip on a worker thread
//! - **Render State**: the [`snapshot`] module aggregates a consistent
//!   per-frame view for the overlay to paint
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`ClipLens`] facade:
//!
//! ```ignore
//! use cliplens_core::ClipLens;
//! use std::sync::mpsc;
//!
//! let app = ClipLens::new()?;
//!
//! // Feed normalized input events from a global hook
//! let (tx, rx) = mpsc::sync_channel(256);
//! app.spawn_input_pump(rx);
//!
//! // Run the overlay on the main thread
//! app.run_overlay()?;
//! ```
//!
//! # Module Structure
//!
//! - [`capture`]: capture regions and screen capture
//! - [`clipboard`]: clipboard content model and access
//! - [`config`]: configuration loading and persistence
//! - [`error`]: error types and result aliases
//! - [`input`]: normalized input events and the modifier gate
//! - [`image_processing`]: encoding, downscaling, fingerprints
//! - [`ocr`]: OCR service client
//! - [`orchestrator`]: gesture side-effect sequencing
//! - [`snapshot`]: per-frame render state
//! - [`tracker`]: the drag gesture state machine
//! - [`ui`]: the overlay window

pub mod capture;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod image_processing;
pub mod input;
pub mod ocr;
pub mod orchestrator;
pub mod snapshot;
pub mod tracker;
pub mod ui;

// Re-export primary types for convenience
pub use capture::{CaptureRegion, ScreenCapturer};
pub use clipboard::{ClipboardContent, SystemClipboard};
pub use config::{Config, DisplayMode};
pub use error::{AppError, Result};
pub use input::{InputEvent, KeyEvent, KeyKind, PointerEvent, PointerKind};
pub use ocr::OcrClient;
pub use orchestrator::{CaptureOrchestrator, OcrJobState};
pub use snapshot::{RenderSnapshot, RenderStateProvider};
pub use tracker::DragTracker;

use crate::clipboard::ClipboardPort;
use crate::input::HeldKeyGate;
use crate::ui::OverlayVisibility;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

/// Locks a mutex, recovering the data if a previous holder panicked.
/// Nothing in this crate leaves shared state half-written on panic.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Main entry point for the cliplens application.
///
/// Wires the tracker, orchestrator, and render state provider together
/// with the real adapters (screen, clipboard, OCR service, overlay
/// window) and owns the input pump.
pub struct ClipLens {
    config: Config,
    tracker: Arc<Mutex<DragTracker>>,
    gate: Arc<HeldKeyGate>,
    orchestrator: Arc<CaptureOrchestrator>,
    provider: Arc<RenderStateProvider>,
    visibility: Arc<OverlayVisibility>,
}

impl ClipLens {
    /// Creates a new instance with configuration loaded from disk and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the OCR API key is missing, the OCR endpoint is
    /// invalid, or screen capture initialization fails.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load()?)
    }

    /// Creates an instance with custom configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let capturer = Arc::new(ScreenCapturer::new()?);
        let clipboard: Arc<dyn ClipboardPort> = Arc::new(SystemClipboard);
        let recognizer = Arc::new(OcrClient::new(&config)?);
        let visibility = Arc::new(OverlayVisibility::new());

        let render_lock = Arc::new(Mutex::new(()));
        let ocr_job = Arc::new(Mutex::new(OcrJobState::Idle));
        let tracker = Arc::new(Mutex::new(DragTracker::new()));
        let gate = Arc::new(HeldKeyGate::new(config.gate_keys.clone()));

        let orchestrator = Arc::new(CaptureOrchestrator::new(
            capturer,
            Arc::clone(&clipboard),
            Arc::clone(&visibility) as Arc<dyn orchestrator::OverlayControl>,
            recognizer,
            Arc::clone(&render_lock),
            Arc::clone(&ocr_job),
        ));

        let provider = Arc::new(RenderStateProvider::new(
            Arc::clone(&tracker),
            ocr_job,
            clipboard,
            render_lock,
            config.display_mode,
            config.preview_scale,
        ));

        Ok(Self {
            config,
            tracker,
            gate,
            orchestrator,
            provider,
            visibility,
        })
    }

    /// Spawns the input pump: a single writer draining the hook channel
    /// into the tracker and handing completed gestures to the
    /// orchestrator. Returns when the sending side hangs up.
    pub fn spawn_input_pump(&self, events: Receiver<InputEvent>) -> thread::JoinHandle<()> {
        let tracker = Arc::clone(&self.tracker);
        let gate = Arc::clone(&self.gate);
        let orchestrator = Arc::clone(&self.orchestrator);

        thread::spawn(move || {
            for event in events {
                if let InputEvent::Key(key) = &event {
                    gate.observe(key);
                }

                let completed = {
                    let mut tracker = lock_unpoisoned(&tracker);
                    tracker.on_event(&event, gate.as_ref());
                    tracker.take_completed()
                };

                orchestrator.handle_completed(completed);
            }
            log::info!("input stream closed, pump exiting");
        })
    }

    /// Runs the overlay window on the calling thread until it closes.
    pub fn run_overlay(&self) -> Result<()> {
        ui::run_overlay(
            Arc::clone(&self.provider),
            Arc::clone(&self.visibility),
            self.config.clone(),
        )
    }

    /// Returns the per-frame render state provider, for embedding the
    /// overlay elsewhere.
    pub fn provider(&self) -> Arc<RenderStateProvider> {
        Arc::clone(&self.provider)
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present and sets up the environment.
pub fn init() {
    let _ = dotenvy::dotenv();
}
