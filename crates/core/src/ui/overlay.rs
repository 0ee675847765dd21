//! The overlay window.
//!
//! A transparent, always-on-top, click-through viewport that consumes one
//! [`RenderSnapshot`] per frame and paints the clipboard preview near the
//! cursor, the in-progress selection rectangles, and the OCR spinner.
//! All state lives in the provider; this loop only reads and draws.

use super::paint;
use crate::config::{Config, DisplayMode};
use crate::error::{AppError, Result};
use crate::image_processing::ImageFingerprint;
use crate::orchestrator::OverlayControl;
use crate::snapshot::{PreviewContent, RenderSnapshot, RenderStateProvider};
use eframe::egui;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hide/show handle for the overlay window.
///
/// The orchestrator calls this around screen captures so the overlay's own
/// pixels never end up in a captured image. Until the frame loop starts
/// and attaches its context, both calls are no-ops.
pub struct OverlayVisibility {
    ctx: Mutex<Option<egui::Context>>,
}

impl OverlayVisibility {
    pub fn new() -> Self {
        Self {
            ctx: Mutex::new(None),
        }
    }

    fn attach(&self, ctx: &egui::Context) {
        let mut slot = crate::lock_unpoisoned(&self.ctx);
        if slot.is_none() {
            *slot = Some(ctx.clone());
        }
    }

    fn set_visible(&self, visible: bool) {
        let slot = crate::lock_unpoisoned(&self.ctx);
        if let Some(ctx) = slot.as_ref() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Visible(visible));
            ctx.request_repaint();
        }
    }
}

impl Default for OverlayVisibility {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayControl for OverlayVisibility {
    fn hide(&self) {
        self.set_visible(false);
    }

    fn show(&self) {
        self.set_visible(true);
    }
}

/// Drag-area tints; alpha comes from configuration.
const PRIMARY_TINT: (u8, u8, u8) = (0, 0, 255);
const SECONDARY_TINT: (u8, u8, u8) = (255, 0, 0);

pub(crate) struct OverlayApp {
    provider: Arc<RenderStateProvider>,
    visibility: Arc<OverlayVisibility>,
    config: Config,
    /// Uploaded preview texture, keyed by the image fingerprint so an
    /// unchanged clipboard image is not re-uploaded every frame.
    preview_texture: Option<(ImageFingerprint, egui::TextureHandle)>,
}

impl OverlayApp {
    pub(crate) fn new(
        provider: Arc<RenderStateProvider>,
        visibility: Arc<OverlayVisibility>,
        config: Config,
    ) -> Self {
        Self {
            provider,
            visibility,
            config,
            preview_texture: None,
        }
    }

    fn anchor(&self, snapshot: &RenderSnapshot, scale: f32) -> egui::Pos2 {
        let offset = egui::vec2(self.config.overlay_left as f32, self.config.overlay_top as f32);
        let cursor = snapshot
            .cursor
            .filter(|_| self.config.follow_mouse)
            .map(|(x, y)| egui::pos2(x as f32 / scale, y as f32 / scale))
            .unwrap_or(egui::Pos2::ZERO);
        cursor + offset
    }
}

impl eframe::App for OverlayApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        egui::Rgba::TRANSPARENT.to_array()
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.visibility.attach(ctx);

        let snapshot = self.provider.snapshot();
        let scale = ctx.pixels_per_point();
        let anchor = self.anchor(&snapshot, scale);

        let alpha = |opacity: f32| (opacity.clamp(0.0, 1.0) * 255.0) as u8;
        let text_color = paint::font_color_for_background(
            paint::NEUTRAL_BACKGROUND,
            self.config.font_color_threshold,
        );

        let panel_frame = egui::Frame::default()
            .inner_margin(egui::Margin::same(0))
            .outer_margin(egui::Margin::same(0));

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let painter = ui.painter();

                // Selection rectangles under everything else.
                if let Some(rect) = snapshot.secondary_drag {
                    let (r, g, b) = SECONDARY_TINT;
                    let color = egui::Color32::from_rgba_unmultiplied(
                        r,
                        g,
                        b,
                        alpha(self.config.drag_area_opacity),
                    );
                    paint::draw_drag_rect(painter, rect, scale, color);
                }
                if let Some(rect) = snapshot.primary_drag {
                    let (r, g, b) = PRIMARY_TINT;
                    let color = egui::Color32::from_rgba_unmultiplied(
                        r,
                        g,
                        b,
                        alpha(self.config.drag_area_opacity),
                    );
                    paint::draw_drag_rect(painter, rect, scale, color);
                }

                // Clipboard preview at the anchor.
                match &snapshot.clipboard {
                    Some(PreviewContent::Text(text)) => {
                        painter.text(
                            anchor,
                            egui::Align2::LEFT_TOP,
                            text,
                            egui::FontId::proportional(self.config.font_size),
                            text_color.gamma_multiply(self.config.clipboard_opacity),
                        );
                    }
                    Some(PreviewContent::TextNonPasteable(text)) => {
                        // No italic face in the default fonts; dim instead.
                        painter.text(
                            anchor,
                            egui::Align2::LEFT_TOP,
                            text,
                            egui::FontId::proportional(self.config.font_size),
                            text_color.gamma_multiply(self.config.clipboard_opacity * 0.6),
                        );
                    }
                    Some(PreviewContent::Image { image, fingerprint }) => {
                        let needs_upload = self
                            .preview_texture
                            .as_ref()
                            .map(|(cached, _)| cached != fingerprint)
                            .unwrap_or(true);

                        if needs_upload {
                            let size = [image.width() as usize, image.height() as usize];
                            let color_image =
                                egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                            let texture = ctx.load_texture(
                                "clipboard-preview",
                                color_image,
                                egui::TextureOptions::LINEAR,
                            );
                            self.preview_texture = Some((*fingerprint, texture));
                        }

                        if let Some((_, texture)) = &self.preview_texture {
                            let size = texture.size_vec2() / scale;
                            painter.image(
                                texture.id(),
                                egui::Rect::from_min_size(anchor, size),
                                egui::Rect::from_min_max(
                                    egui::pos2(0.0, 0.0),
                                    egui::pos2(1.0, 1.0),
                                ),
                                egui::Color32::WHITE
                                    .gamma_multiply(self.config.clipboard_opacity),
                            );
                        }
                    }
                    None => {}
                }

                // Spinner while OCR is in flight.
                if snapshot.ocr_busy {
                    paint::draw_spinner(
                        painter,
                        anchor + egui::vec2(-12.0, 6.0),
                        8.0,
                        snapshot.rotation_angle,
                        text_color,
                    );
                }
            });

        let frame_interval = Duration::from_millis(1000 / self.config.overlay_fps.max(1) as u64);
        ctx.request_repaint_after(frame_interval);
    }
}

/// Launches the overlay and blocks until the window closes.
pub fn run_overlay(
    provider: Arc<RenderStateProvider>,
    visibility: Arc<OverlayVisibility>,
    config: Config,
) -> Result<()> {
    if config.display_mode == DisplayMode::Off {
        log::info!("clipboard preview disabled; overlay shows selections only");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_decorations(false)
            .with_transparent(true)
            .with_mouse_passthrough(true)
            .with_always_on_top(),
        ..Default::default()
    };

    eframe::run_native(
        "cliplens",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(OverlayApp::new(provider, visibility, config)) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run overlay: {}", e)))
}
