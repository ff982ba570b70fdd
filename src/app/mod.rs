use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context, Vec2};
use netgraph_live::feed::{DeltaSource, FeedEvent, Snapshot, load_snapshot, spawn_delta_feed};
use netgraph_live::graph::Delta;
use netgraph_live::layout::LayoutConfig;
use netgraph_live::session::GraphSession;
use tracing::{info, warn};

mod canvas;
mod panels;
mod render_utils;

const FEED_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct LiveGraphApp {
    snapshot_path: PathBuf,
    config: LayoutConfig,
    /// Held here while no view is ready; the view owns it otherwise.
    parked_feed: Option<DeltaFeed>,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Snapshot, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum FeedStatus {
    #[default]
    Disabled,
    Streaming,
    Closed,
    Failed(String),
}

/// The delta stream. Opened once per process so a reload never spawns a
/// second reader competing for the same input.
#[derive(Default)]
struct DeltaFeed {
    rx: Option<Receiver<FeedEvent>>,
    status: FeedStatus,
    malformed: usize,
}

impl DeltaFeed {
    fn open(source: Option<DeltaSource>) -> Self {
        match source.map(spawn_delta_feed) {
            None => Self::default(),
            Some(Ok(rx)) => Self::from_receiver(rx),
            Some(Err(error)) => {
                let message = format!("{error:#}");
                warn!(%message, "delta feed unavailable");
                Self {
                    status: FeedStatus::Failed(message),
                    ..Self::default()
                }
            }
        }
    }

    fn from_receiver(rx: Receiver<FeedEvent>) -> Self {
        Self {
            rx: Some(rx),
            status: FeedStatus::Streaming,
            malformed: 0,
        }
    }

    fn is_open(&self) -> bool {
        self.rx.is_some()
    }

    /// Takes every delta queued so far without blocking.
    fn drain(&mut self) -> Vec<Delta> {
        let mut deltas = Vec::new();
        let Some(rx) = self.rx.as_ref() else {
            return deltas;
        };

        let mut finished = false;
        loop {
            match rx.try_recv() {
                Ok(FeedEvent::Delta(delta)) => deltas.push(delta),
                Ok(FeedEvent::Malformed { line, error }) => {
                    self.malformed += 1;
                    warn!(line, %error, "skipping malformed delta");
                }
                Ok(FeedEvent::Closed) | Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if finished {
            info!("delta feed closed");
            self.rx = None;
            self.status = FeedStatus::Closed;
        }
        deltas
    }
}

struct ViewModel {
    session: GraphSession,
    feed: DeltaFeed,
    search: String,
    selected: Option<String>,
    pan: Vec2,
    zoom: f32,
    show_labels: bool,
    tuning: LayoutConfig,
}

impl LiveGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        snapshot_path: PathBuf,
        delta_source: Option<DeltaSource>,
        config: LayoutConfig,
    ) -> Self {
        let state = Self::start_load(snapshot_path.clone());
        Self {
            snapshot_path,
            config,
            parked_feed: Some(DeltaFeed::open(delta_source)),
            state,
        }
    }

    fn start_load(snapshot_path: PathBuf) -> AppState {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_snapshot(&snapshot_path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        AppState::Loading { rx }
    }

    fn ready(&mut self, snapshot: Snapshot) -> AppState {
        let mut session = GraphSession::new(self.config);
        if let Err(error) = session.load_snapshot(snapshot) {
            return AppState::Error(error.to_string());
        }

        let feed = self.parked_feed.take().unwrap_or_default();
        AppState::Ready(Box::new(ViewModel::new(session, feed, self.config)))
    }
}

impl eframe::App for LiveGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut loaded = None;
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => loaded = Some(result),
                    Err(TryRecvError::Disconnected) => {
                        loaded = Some(Err("snapshot loader disconnected".to_owned()));
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint_after(FEED_POLL_INTERVAL),
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading network graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the network graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.snapshot_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &mut reload_requested);
                if reload_requested {
                    self.config = model.tuning;
                    self.parked_feed = Some(model.take_feed());
                    transition = Some(Self::start_load(self.snapshot_path.clone()));
                }
            }
        }

        if let Some(result) = loaded {
            transition = Some(match result {
                Ok(snapshot) => self.ready(snapshot),
                Err(error) => AppState::Error(error),
            });
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(session: GraphSession, feed: DeltaFeed, tuning: LayoutConfig) -> Self {
        Self {
            session,
            feed,
            search: String::new(),
            selected: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            show_labels: true,
            tuning,
        }
    }

    fn show(&mut self, ctx: &Context, reload_requested: &mut bool) {
        self.drain_feed();

        egui::SidePanel::left("graph_panel")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_panel(ui, reload_requested);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        if self.feed.is_open() {
            ctx.request_repaint_after(FEED_POLL_INTERVAL);
        }
    }

    /// Applies every delta queued since the last frame as one batch, before
    /// the next tick.
    fn drain_feed(&mut self) {
        let deltas = self.feed.drain();
        if !deltas.is_empty() {
            self.session.apply_deltas(deltas);
        }
    }

    fn take_feed(&mut self) -> DeltaFeed {
        std::mem::take(&mut self.feed)
    }

    fn set_selected(&mut self, selected: Option<String>) {
        self.selected = selected;
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.session.teardown();
    }
}
