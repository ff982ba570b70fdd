use std::collections::HashSet;

use eframe::egui::{self, Align2, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use netgraph_live::util::short_id;

use super::ViewModel;
use super::render_utils::{
    HIGHLIGHT, LINK_COLOR, NODE_STROKE, circle_visible, contrast_text, draw_background,
    screen_to_world, segment_visible, world_to_screen,
};

const LABEL_MIN_ZOOM: f32 = 0.55;

fn fuzzy_match(matcher: &SkimMatcherV2, text: &str, query: &str) -> bool {
    matcher.fuzzy_match(text, query).is_some()
        || matcher
            .fuzzy_match(&text.to_lowercase(), &query.to_lowercase())
            .is_some()
}

impl ViewModel {
    pub(super) fn search_matches(&self) -> HashSet<String> {
        let query = self.search.trim();
        if query.is_empty() {
            return HashSet::new();
        }

        let matcher = SkimMatcherV2::default();
        self.session
            .model()
            .nodes()
            .iter()
            .filter(|node| fuzzy_match(&matcher, &node.label, query) || node.id.starts_with(query))
            .map(|node| node.id.clone())
            .collect()
    }

    fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let anchor = screen_to_world(rect, self.pan, self.zoom, pointer);

        self.zoom = (self.zoom * (1.0 + scroll * 0.0015).clamp(0.85, 1.15)).clamp(0.05, 8.0);
        self.pan = pointer - rect.center() - anchor * self.zoom;
    }

    fn handle_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    fn hovered_node(&self, ui: &Ui, rect: Rect) -> Option<String> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }

        self.session
            .scene()
            .nodes()
            .filter_map(|(id, entry)| {
                let center = world_to_screen(rect, self.pan, self.zoom, entry.placement);
                let distance = center.distance(pointer);
                let reach = (entry.radius() * self.zoom).max(4.0);
                (distance <= reach).then_some((id, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.to_owned())
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        if self.session.frame(delta_seconds) {
            ui.ctx().request_repaint();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.handle_zoom(ui, rect, &response);
        self.handle_pan(&response);
        draw_background(&painter, rect, self.pan, self.zoom);

        let hovered = self.hovered_node(ui, rect);
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }
        if response.clicked_by(egui::PointerButton::Primary) {
            self.set_selected(hovered.clone());
        }

        let matches = self.search_matches();
        let (pan, zoom) = (self.pan, self.zoom);
        let to_screen = |world: Vec2| world_to_screen(rect, pan, zoom, world);
        let scene = self.session.scene();

        let link_stroke = Stroke::new((1.5 * zoom.sqrt()).clamp(0.5, 3.0), LINK_COLOR);
        for (_, link) in scene.links() {
            let (start, end) = (to_screen(link.from), to_screen(link.to));
            if segment_visible(rect, start, end) {
                painter.line_segment([start, end], link_stroke);
            }
        }

        let node_stroke = Stroke::new(1.5, NODE_STROKE);
        let mut visible_nodes = 0usize;
        for (id, entry) in scene.nodes() {
            let center = to_screen(entry.placement);
            let radius = entry.radius() * zoom;
            if !circle_visible(rect, center, radius + 40.0) {
                continue;
            }
            visible_nodes += 1;

            let emphasized = matches.contains(id) || self.selected.as_deref() == Some(id);
            let stroke = if emphasized {
                Stroke::new(3.0, HIGHLIGHT)
            } else {
                node_stroke
            };
            painter.circle(center, radius, entry.fill, stroke);

            if self.show_labels && zoom >= LABEL_MIN_ZOOM && !entry.is_entering() {
                painter.text(
                    center + vec2(0.0, radius + 4.0),
                    Align2::CENTER_TOP,
                    display_label(&entry.label, id),
                    FontId::proportional(12.0),
                    egui::Color32::from_gray(30),
                );
            }
        }

        if let Some(id) = hovered.as_deref()
            && let Some(node) = scene.node(id)
        {
            let anchor = to_screen(node.placement) + vec2(node.radius() * zoom + 8.0, -8.0);
            draw_tag(&painter, anchor, display_label(&node.label, id), node.fill);
        }

        painter.text(
            rect.left_top() + vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            format!(
                "{} of {} nodes in view | zoom {:.2}",
                visible_nodes,
                scene.node_count(),
                zoom
            ),
            FontId::proportional(13.0),
            egui::Color32::from_gray(70),
        );
    }
}

fn display_label<'a>(label: &'a str, id: &'a str) -> &'a str {
    if label.trim().is_empty() {
        short_id(id)
    } else {
        label
    }
}

fn draw_tag(painter: &egui::Painter, anchor: Pos2, text: &str, fill: egui::Color32) {
    let text_color = contrast_text(fill);
    let galley = painter.layout_no_wrap(text.to_owned(), FontId::proportional(13.0), text_color);
    let frame = Rect::from_min_size(anchor, galley.size()).expand2(vec2(6.0, 3.0));
    painter.rect_filled(frame, 4.0, fill);
    painter.galley(anchor, galley, text_color);
}
