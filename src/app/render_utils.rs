use std::f32::consts::TAU;

use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2};
use reply_grapher::util::stable_hue;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

/// Darkens a colour and fades it, keeping at least half its opacity.
pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    let scale = |channel: u8| (channel as f32 * factor) as u8;
    Color32::from_rgba_unmultiplied(
        scale(color.r()),
        scale(color.g()),
        scale(color.b()),
        (color.a() as f32 * (0.5 + factor * 0.5)) as u8,
    )
}

/// Converts HSL (hue in degrees, saturation and lightness in 0..=1) to RGB.
pub(super) fn hsl_to_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue.rem_euclid(360.0) / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let channel = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgb(channel(r), channel(g), channel(b))
}

pub(super) fn uid_color(uid: &str) -> Color32 {
    hsl_to_color(stable_hue(uid), 0.7, 0.5)
}

pub(super) fn post_radius(reply_count: usize) -> f32 {
    4.0 + ((reply_count as f32).sqrt() * 1.6).min(10.0)
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(22, 24, 30));

    let step = (64.0 * zoom.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(64, 72, 84, 60));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

/// Partial ring around a point, `progress` in 0..=1 of a full turn starting
/// at twelve o'clock.
pub(super) fn draw_progress_ring(
    painter: &Painter,
    center: Pos2,
    radius: f32,
    progress: f32,
    stroke: Stroke,
) {
    const SEGMENTS: usize = 32;

    let progress = progress.clamp(0.0, 1.0);
    if progress <= 0.0 {
        painter.circle_stroke(center, radius, Stroke::new(stroke.width * 0.5, stroke.color));
        return;
    }

    let steps = ((SEGMENTS as f32 * progress).ceil() as usize).max(1);
    let points = (0..=steps)
        .map(|step| {
            let angle = -TAU / 4.0 + TAU * progress * step as f32 / steps as f32;
            center + Vec2::angled(angle) * radius
        })
        .collect::<Vec<_>>();
    painter.add(Shape::line(points, stroke));
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// A cubic Bézier stays inside the hull of its control points, so the
/// bounding box of those points is a safe cull test.
pub(super) fn curve_visible(rect: Rect, points: &[Pos2; 4]) -> bool {
    Rect::from_points(points).intersects(rect)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_color(0.0, 1.0, 0.5), Color32::from_rgb(255, 0, 0));
        assert_eq!(hsl_to_color(120.0, 1.0, 0.5), Color32::from_rgb(0, 255, 0));
        assert_eq!(hsl_to_color(240.0, 1.0, 0.5), Color32::from_rgb(0, 0, 255));
        assert_eq!(hsl_to_color(0.0, 0.0, 1.0), Color32::from_rgb(255, 255, 255));
    }

    #[test]
    fn same_uid_same_colour() {
        assert_eq!(uid_color("AbCd1234"), uid_color("AbCd1234"));
    }

    #[test]
    fn screen_and_world_round_trip() {
        let rect = Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(800.0, 600.0));
        let pan = Vec2::new(12.0, -30.0);
        let world = Vec2::new(150.0, -75.0);
        let screen = world_to_screen(rect, pan, 1.5, world);
        let back = screen_to_world(rect, pan, 1.5, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn radius_grows_then_caps() {
        assert_eq!(post_radius(0), 4.0);
        assert!(post_radius(4) > post_radius(1));
        assert_eq!(post_radius(10_000), 14.0);
    }
}
