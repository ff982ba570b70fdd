//! Single-threaded wiring of model, layout and scene.
//!
//! Every mutation flows model -> layout reseed -> scene sync, and every frame
//! steps the layout once and pushes the new positions into the scene.

use tracing::{debug, info, warn};

use crate::feed::Snapshot;
use crate::graph::{Delta, DeltaReport, GraphError, GraphModel};
use crate::layout::{LayoutConfig, LayoutEngine};
use crate::scene::{RenderSurface, SceneReconciler};

#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    pub deltas_applied: usize,
    pub dangling_links: usize,
    pub resyncs: usize,
    pub ticks: u64,
    pub last_report: Option<DeltaReport>,
}

pub struct GraphSession {
    model: GraphModel,
    layout: LayoutEngine,
    scene: SceneReconciler,
    stats: SessionStats,
}

impl GraphSession {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            model: GraphModel::new(),
            layout: LayoutEngine::new(config),
            scene: SceneReconciler::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<(), GraphError> {
        if let Err(error) = self.model.load_snapshot(snapshot.nodes, snapshot.links) {
            warn!(%error, "snapshot rejected");
            return Err(error);
        }

        info!(
            nodes = self.model.node_count(),
            links = self.model.link_count(),
            "snapshot loaded"
        );
        self.resync();
        Ok(())
    }

    /// Merges one delta. Rejected entries are logged and counted, never raised.
    pub fn apply_delta(&mut self, delta: Delta) -> DeltaReport {
        self.apply_deltas([delta]).pop().unwrap_or_default()
    }

    /// Merges a batch of deltas in order, then reseeds and syncs once.
    /// Empty deltas are skipped and produce no report.
    pub fn apply_deltas<I>(&mut self, deltas: I) -> Vec<DeltaReport>
    where
        I: IntoIterator<Item = Delta>,
    {
        let reports = deltas
            .into_iter()
            .filter(|delta| !delta.is_empty())
            .map(|delta| self.merge(delta))
            .collect::<Vec<_>>();

        if !reports.is_empty() {
            self.resync();
        }
        reports
    }

    fn merge(&mut self, delta: Delta) -> DeltaReport {
        let report = self.model.apply_delta(delta);
        for error in &report.rejected {
            warn!(%error, "delta entry skipped");
        }

        self.stats.deltas_applied += 1;
        self.stats.dangling_links += report.rejected.len();
        self.stats.last_report = Some(report.clone());

        debug!(
            nodes_inserted = report.nodes_inserted,
            nodes_updated = report.nodes_updated,
            links_inserted = report.links_inserted,
            links_removed = report.links_removed,
            rejected = report.rejected.len(),
            "delta applied"
        );
        report
    }

    /// Advances transitions by `delta_seconds` and the layout by one tick.
    /// Returns true while anything is still moving.
    pub fn frame(&mut self, delta_seconds: f32) -> bool {
        let animating = self.scene.advance(delta_seconds);

        let scene = &mut self.scene;
        let ticked = self.layout.tick(|positions| scene.on_tick(positions));
        if ticked {
            self.stats.ticks += 1;
            if !self.layout.is_running() {
                debug!(ticks = self.stats.ticks, "layout at rest");
            }
        }

        animating || self.layout.is_running()
    }

    /// Runs frames until the layout rests or `max_ticks` is reached.
    pub fn settle(&mut self, max_ticks: usize, delta_seconds: f32) -> usize {
        let mut ticks = 0;
        while ticks < max_ticks && self.frame(delta_seconds) {
            ticks += 1;
        }
        ticks
    }

    pub fn reheat(&mut self) {
        self.layout.reheat();
    }

    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.layout.set_config(config);
        self.layout.reheat();
    }

    /// Stops the tick loop and releases every node, link and entry.
    pub fn teardown(&mut self) {
        self.layout.stop();
        self.scene.clear();
        self.model.clear();
        info!("graph session torn down");
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn layout(&self) -> &LayoutEngine {
        &self.layout
    }

    pub fn scene(&self) -> &SceneReconciler {
        &self.scene
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn surface(&self) -> RenderSurface {
        self.scene.surface()
    }

    fn resync(&mut self) {
        self.stats.resyncs += 1;
        self.layout.reseed(self.model.nodes(), self.model.links());
        let sync = self
            .scene
            .sync(self.model.nodes(), self.model.links(), self.layout.positions());
        debug!(
            entered = sync.entered,
            exited = sync.exited,
            retained = sync.retained,
            "scene synced"
        );
    }
}
