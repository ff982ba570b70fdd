use eframe::egui::{self, RichText, Ui};
use netgraph_live::util::short_id;

use super::{FeedStatus, ViewModel};

const MATCH_ROWS: usize = 24;

impl ViewModel {
    pub(super) fn draw_panel(&mut self, ui: &mut Ui, reload_requested: &mut bool) {
        ui.heading("Network graph");
        ui.separator();

        self.draw_status(ui);
        ui.separator();

        self.draw_search(ui);
        ui.separator();

        self.draw_tuning(ui, reload_requested);
        ui.separator();

        self.draw_selection(ui);
    }

    fn draw_status(&self, ui: &mut Ui) {
        let model = self.session.model();
        let scene = self.session.scene();
        let layout = self.session.layout();
        let stats = self.session.stats();

        ui.label(format!(
            "Nodes: {} ({} drawn)",
            model.node_count(),
            scene.node_count()
        ));
        ui.label(format!(
            "Channels: {} ({} drawn)",
            model.link_count(),
            scene.link_count()
        ));

        let state = if layout.is_running() { "running" } else { "at rest" };
        ui.label(format!("Layout: {state}, alpha {:.3}", layout.alpha()));

        let feed = match &self.feed.status {
            FeedStatus::Disabled => "no update feed".to_owned(),
            FeedStatus::Streaming => "streaming".to_owned(),
            FeedStatus::Closed => "closed".to_owned(),
            FeedStatus::Failed(error) => format!("failed: {error}"),
        };
        ui.label(format!("Feed: {feed}"));
        ui.label(format!("Updates applied: {}", stats.deltas_applied));

        if self.feed.malformed > 0 {
            ui.colored_label(
                ui.visuals().warn_fg_color,
                format!("Malformed updates skipped: {}", self.feed.malformed),
            );
        }
        if stats.dangling_links > 0 {
            ui.colored_label(
                ui.visuals().warn_fg_color,
                format!("Dangling channels skipped: {}", stats.dangling_links),
            )
            .on_hover_text("Channels whose endpoints were unknown when the update arrived.");
        }

        if let Some(report) = &stats.last_report {
            ui.small(format!(
                "Last update: +{} nodes, ~{} nodes, +{} channels, -{} channels",
                report.nodes_inserted,
                report.nodes_updated,
                report.links_inserted,
                report.links_removed
            ));
        }
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search (alias or pubkey)")
            .on_hover_text("Fuzzy-highlight matching nodes on the canvas.");
        ui.text_edit_singleline(&mut self.search);
        ui.checkbox(&mut self.show_labels, "Show labels");

        let matches = self.search_matches();
        if matches.is_empty() {
            return;
        }

        let mut rows = matches
            .iter()
            .filter_map(|id| self.session.model().node(id))
            .map(|node| (node.label.clone(), node.id.clone()))
            .collect::<Vec<_>>();
        rows.sort();

        ui.small(format!("{} matches", rows.len()));
        let mut clicked = None;
        for (label, id) in rows.iter().take(MATCH_ROWS) {
            let text = if label.is_empty() { short_id(id) } else { label.as_str() };
            let selected = self.selected.as_deref() == Some(id.as_str());
            if ui.selectable_label(selected, text).clicked() {
                clicked = Some(id.clone());
            }
        }
        if clicked.is_some() {
            self.set_selected(clicked);
        }
    }

    fn draw_tuning(&mut self, ui: &mut Ui, reload_requested: &mut bool) {
        let mut changed = false;

        ui.collapsing("Layout tuning", |ui| {
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.tuning.charge_strength, -1000.0..=-10.0)
                        .text("Charge")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("How strongly nodes push each other apart.")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.tuning.link_distance, 10.0..=400.0)
                        .text("Channel length")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("Rest length of the spring along each channel.")
                .changed();
            changed |= ui
                .add(
                    egui::Slider::new(&mut self.tuning.axis_strength, 0.0..=0.5)
                        .text("Centering pull")
                        .clamping(egui::SliderClamping::Always),
                )
                .on_hover_text("Pull toward the horizontal and vertical axes.")
                .changed();
        });

        if changed {
            self.session.set_layout_config(self.tuning);
        }

        ui.horizontal(|ui| {
            if ui.button("Reheat layout").clicked() {
                self.session.reheat();
            }
            if ui.button("Reset view").clicked() {
                self.pan = egui::Vec2::ZERO;
                self.zoom = 1.0;
            }
            if ui.button("Reload snapshot").clicked() {
                *reload_requested = true;
            }
        });
    }

    fn draw_selection(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Selection").strong());

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node to inspect it.");
            return;
        };

        let model = self.session.model();
        let Some(node) = model.node(&selected_id) else {
            ui.label("Selected node is no longer in the graph.");
            return;
        };

        let label = if node.label.is_empty() {
            short_id(&node.id)
        } else {
            node.label.as_str()
        };
        ui.label(RichText::new(label).strong());
        ui.small(node.id.as_str());
        ui.label(format!("Color: {}", node.color));
        ui.label(format!("Channels: {}", model.degree(&node.id)));
        if let Some(position) = self.session.layout().position(&node.id) {
            ui.label(format!("Position: ({:.1}, {:.1})", position.x, position.y));
        }

        if ui.button("Clear selection").clicked() {
            self.set_selected(None);
        }
    }
}
