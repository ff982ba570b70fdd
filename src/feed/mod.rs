mod source;
mod wire;

pub use source::{DeltaSource, FeedEvent, load_snapshot, spawn_delta_feed};
pub use wire::{Snapshot, decode_delta, decode_snapshot};
