mod app;
mod headless;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use netgraph_live::feed::DeltaSource;
use netgraph_live::layout::LayoutConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Graph snapshot (JSON with `nodes` and `channels`).
    #[arg(long)]
    snapshot: PathBuf,

    /// Newline-delimited JSON graph updates; `-` reads standard input.
    #[arg(long)]
    deltas: Option<String>,

    /// Settle the layout without a window and print the render surface as JSON.
    #[arg(long)]
    headless: bool,

    /// Upper bound on simulation ticks in headless mode.
    #[arg(long, default_value_t = 2000)]
    max_ticks: usize,

    /// Many-body charge strength (negative repels).
    #[arg(long, allow_hyphen_values = true)]
    charge: Option<f32>,

    /// Rest length of link springs.
    #[arg(long)]
    link_distance: Option<f32>,

    /// Distance beyond which nodes stop repelling each other.
    #[arg(long)]
    distance_max: Option<f32>,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn layout_config(&self) -> LayoutConfig {
        let defaults = LayoutConfig::default();
        LayoutConfig {
            charge_strength: self.charge.unwrap_or(defaults.charge_strength),
            link_distance: self.link_distance.unwrap_or(defaults.link_distance),
            distance_max: self.distance_max.unwrap_or(defaults.distance_max),
            ..defaults
        }
    }

    fn delta_source(&self) -> Option<DeltaSource> {
        self.deltas.as_deref().map(DeltaSource::from_arg)
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.layout_config();
    let delta_source = args.delta_source();

    if args.headless {
        return headless::run(&args.snapshot, delta_source, config, args.max_ticks);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let snapshot_path = args.snapshot.clone();
    eframe::run_native(
        "netgraph-live",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::LiveGraphApp::new(
                cc,
                snapshot_path,
                delta_source,
                config,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
