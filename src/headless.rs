use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use netgraph_live::feed::{DeltaSource, FeedEvent, load_snapshot, spawn_delta_feed};
use netgraph_live::layout::LayoutConfig;
use netgraph_live::session::GraphSession;
use tracing::{info, warn};

const FRAME_SECONDS: f32 = 1.0 / 60.0;

/// Loads, applies every queued delta, settles, then prints the render surface.
pub fn run(
    snapshot_path: &Path,
    delta_source: Option<DeltaSource>,
    config: LayoutConfig,
    max_ticks: usize,
) -> Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let mut session = GraphSession::new(config);
    session
        .load_snapshot(snapshot)
        .context("snapshot failed validation")?;

    if let Some(source) = delta_source {
        let feed = spawn_delta_feed(source)?;
        for event in feed.iter() {
            match event {
                FeedEvent::Delta(delta) => {
                    session.apply_delta(delta);
                    session.frame(FRAME_SECONDS);
                }
                FeedEvent::Malformed { line, error } => {
                    warn!(line, %error, "skipping malformed delta");
                }
                FeedEvent::Closed => break,
            }
        }
    }

    let ticks = session.settle(max_ticks, FRAME_SECONDS);
    let stats = session.stats();
    info!(
        ticks,
        deltas = stats.deltas_applied,
        dangling = stats.dangling_links,
        at_rest = !session.layout().is_running(),
        "layout settled"
    );

    let surface = session.surface();
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &surface).context("failed to write render surface")?;
    writeln!(stdout).context("failed to write render surface")?;

    session.teardown();
    Ok(())
}
