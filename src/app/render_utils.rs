use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) const BACKGROUND: Color32 = Color32::from_rgb(0xf0, 0xf0, 0xf0);
pub(super) const LINK_COLOR: Color32 = Color32::from_rgba_premultiplied(92, 92, 92, 153);
pub(super) const NODE_STROKE: Color32 = Color32::from_rgb(0x99, 0x99, 0x99);
pub(super) const HIGHLIGHT: Color32 = Color32::from_rgb(0xe0, 0x8a, 0x1e);

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan: Vec2, zoom: f32) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let step = (80.0 * zoom.clamp(0.5, 2.0)).max(24.0);
    let origin = rect.center() + pan;
    let stroke = Stroke::new(1.0, Color32::from_gray(228));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.vline(x, rect.y_range(), stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.hline(rect.x_range(), y, stroke);
        y += step;
    }
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

pub(super) fn circle_visible(rect: Rect, center: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(center)
}

/// Conservative cull: keeps any segment whose bounding box touches the view.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    rect.intersects(Rect::from_two_pos(start, end).expand(1.0))
}

/// Readable label colour for text drawn over `fill`.
pub(super) fn contrast_text(fill: Color32) -> Color32 {
    let luma = 0.299 * fill.r() as f32 + 0.587 * fill.g() as f32 + 0.114 * fill.b() as f32;
    if luma > 150.0 {
        Color32::from_gray(20)
    } else {
        Color32::from_gray(245)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};

    fn view() -> Rect {
        Rect::from_min_max(pos2(0.0, 0.0), pos2(200.0, 100.0))
    }

    #[test]
    fn screen_and_world_round_trip() {
        let world = vec2(12.5, -40.0);
        let screen = world_to_screen(view(), vec2(10.0, 5.0), 2.0, world);
        assert_eq!(screen, pos2(135.0, -25.0));
        assert_eq!(screen_to_world(view(), vec2(10.0, 5.0), 2.0, screen), world);
    }

    #[test]
    fn culling_keeps_partially_visible_items() {
        assert!(circle_visible(view(), pos2(-5.0, 50.0), 10.0));
        assert!(!circle_visible(view(), pos2(-50.0, 50.0), 10.0));
        assert!(segment_visible(view(), pos2(-50.0, 50.0), pos2(300.0, 50.0)));
        assert!(!segment_visible(view(), pos2(-50.0, -50.0), pos2(-10.0, -20.0)));
    }

    #[test]
    fn text_contrasts_with_fill() {
        assert_eq!(contrast_text(Color32::WHITE), Color32::from_gray(20));
        assert_eq!(contrast_text(Color32::BLACK), Color32::from_gray(245));
    }
}
