//! Painting helpers for the overlay.
//!
//! Small pure functions the frame loop composes: selection rectangles,
//! the OCR spinner, and the black-or-white text color decision.

use crate::tracker::DragRect;
use eframe::egui;
use std::f32::consts::TAU;

/// Reference color the text contrast decision is made against. The
/// desktop pixel under the overlay cannot be sampled portably, so the
/// threshold selects light-on-dark vs dark-on-light relative to this.
pub const NEUTRAL_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(128, 128, 128);

/// Picks white or black text for the given background, using a weighted
/// luminance (`r*2 + g*7 + b`) against the configured cutoff.
pub fn font_color_for_background(background: egui::Color32, threshold: i32) -> egui::Color32 {
    let weight =
        background.r() as i32 * 2 + background.g() as i32 * 7 + background.b() as i32;
    if weight < threshold {
        egui::Color32::WHITE
    } else {
        egui::Color32::BLACK
    }
}

/// Fills an in-progress selection rectangle.
pub fn draw_drag_rect(painter: &egui::Painter, rect: DragRect, scale: f32, color: egui::Color32) {
    let a = egui::pos2(rect.start.0 as f32 / scale, rect.start.1 as f32 / scale);
    let b = egui::pos2(rect.current.0 as f32 / scale, rect.current.1 as f32 / scale);
    painter.rect_filled(egui::Rect::from_two_pos(a, b), 0.0, color);
}

/// Draws the OCR busy spinner: a ring of dots with the head at `angle`
/// and a fading tail behind it.
pub fn draw_spinner(
    painter: &egui::Painter,
    center: egui::Pos2,
    radius: f32,
    angle: f32,
    color: egui::Color32,
) {
    const DOTS: usize = 8;
    for i in 0..DOTS {
        let phase = angle - i as f32 * TAU / DOTS as f32;
        let pos = center + egui::vec2(phase.cos(), phase.sin()) * radius;
        let fade = 1.0 - i as f32 / DOTS as f32;
        painter.circle_filled(pos, radius * 0.18, color.gamma_multiply(fade));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_backgrounds_get_white_text() {
        let color = font_color_for_background(egui::Color32::from_rgb(10, 10, 10), 1275);
        assert_eq!(color, egui::Color32::WHITE);
    }

    #[test]
    fn light_backgrounds_get_black_text() {
        let color = font_color_for_background(egui::Color32::from_rgb(250, 250, 250), 1275);
        assert_eq!(color, egui::Color32::BLACK);
    }

    #[test]
    fn threshold_moves_the_cutoff() {
        // Mid-gray weighs 1280; a threshold above it flips to white text.
        let gray = NEUTRAL_BACKGROUND;
        assert_eq!(font_color_for_background(gray, 1275), egui::Color32::BLACK);
        assert_eq!(font_color_for_background(gray, 2000), egui::Color32::WHITE);
    }
}
