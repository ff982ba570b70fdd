mod surface;

use std::collections::{HashMap, HashSet};

use eframe::egui::{Color32, Vec2};

use crate::graph::{Link, Node};
use crate::layout::PositionView;

pub use surface::{LinkPlacement, NodePlacement, RenderSurface};

pub const NODE_RADIUS: f32 = 10.0;
pub const ENTER_SECONDS: f32 = 0.25;
pub const DEFAULT_FILL: Color32 = Color32::from_rgb(0x99, 0x99, 0x99);

pub struct NodeEntry {
    pub label: String,
    pub fill: Color32,
    pub placement: Vec2,
    enter_progress: f32,
}

impl NodeEntry {
    pub fn radius(&self) -> f32 {
        NODE_RADIUS * ease_cubic_in_out(self.enter_progress)
    }

    pub fn is_entering(&self) -> bool {
        self.enter_progress < 1.0
    }
}

pub struct LinkEntry {
    pub source_id: String,
    pub target_id: String,
    pub from: Vec2,
    pub to: Vec2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub entered: usize,
    pub exited: usize,
    pub retained: usize,
}

/// Identity-keyed diff between the model's collections and what is on screen.
#[derive(Default)]
pub struct SceneReconciler {
    nodes: HashMap<String, NodeEntry>,
    links: HashMap<String, LinkEntry>,
}

impl SceneReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sync(&mut self, nodes: &[Node], links: &[Link], positions: PositionView<'_>) -> SyncReport {
        let mut report = SyncReport::default();

        let live_nodes = nodes.iter().map(|node| node.id.as_str()).collect::<HashSet<_>>();
        let before = self.nodes.len();
        self.nodes.retain(|id, _| live_nodes.contains(id.as_str()));
        report.exited += before - self.nodes.len();

        for node in nodes {
            let fill = parse_hex_color(&node.color).unwrap_or(DEFAULT_FILL);
            if let Some(entry) = self.nodes.get_mut(&node.id) {
                entry.fill = fill;
                entry.label.clone_from(&node.label);
                report.retained += 1;
                continue;
            }

            self.nodes.insert(
                node.id.clone(),
                NodeEntry {
                    label: node.label.clone(),
                    fill,
                    placement: positions.get(&node.id).unwrap_or(Vec2::ZERO),
                    enter_progress: 0.0,
                },
            );
            report.entered += 1;
        }

        let live_links = links.iter().map(|link| link.id.as_str()).collect::<HashSet<_>>();
        let before = self.links.len();
        self.links.retain(|id, _| live_links.contains(id.as_str()));
        report.exited += before - self.links.len();

        for link in links {
            if self.links.contains_key(&link.id) {
                report.retained += 1;
                continue;
            }

            let from = positions.get(&link.source_id).unwrap_or(Vec2::ZERO);
            let to = positions.get(&link.target_id).unwrap_or(Vec2::ZERO);
            self.links.insert(
                link.id.clone(),
                LinkEntry {
                    source_id: link.source_id.clone(),
                    target_id: link.target_id.clone(),
                    from,
                    to,
                },
            );
            report.entered += 1;
        }

        report
    }

    /// Moves every rendered entry to the latest simulated position.
    pub fn on_tick(&mut self, positions: PositionView<'_>) {
        for entry in self.links.values_mut() {
            if let Some(from) = positions.get(&entry.source_id) {
                entry.from = from;
            }
            if let Some(to) = positions.get(&entry.target_id) {
                entry.to = to;
            }
        }

        for (id, entry) in &mut self.nodes {
            if let Some(position) = positions.get(id) {
                entry.placement = position;
            }
        }
    }

    /// Steps enter transitions. Returns true while any is still playing.
    pub fn advance(&mut self, delta_seconds: f32) -> bool {
        let step = (delta_seconds / ENTER_SECONDS).max(0.0);
        let mut animating = false;
        for entry in self.nodes.values_mut().filter(|entry| entry.is_entering()) {
            entry.enter_progress = (entry.enter_progress + step).min(1.0);
            animating |= entry.is_entering();
        }
        animating
    }

    pub fn node(&self, id: &str) -> Option<&NodeEntry> {
        self.nodes.get(id)
    }

    pub fn link(&self, id: &str) -> Option<&LinkEntry> {
        self.links.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeEntry)> {
        self.nodes.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn links(&self) -> impl Iterator<Item = (&str, &LinkEntry)> {
        self.links.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn surface(&self) -> RenderSurface {
        RenderSurface::collect(self)
    }

    pub fn clear(&mut self) {
        self.nodes = HashMap::new();
        self.links = HashMap::new();
    }
}

fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

/// Parses `#rrggbb` / `#rgb` colours as sent by the network daemon.
pub fn parse_hex_color(value: &str) -> Option<Color32> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();

    match hex.len() {
        6 => Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => {
            let expand = |index: usize| channel(index..index + 1).map(|value| value * 17);
            Some(Color32::from_rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}
