use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::wire::{Snapshot, decode_delta, decode_snapshot};
use crate::graph::Delta;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeltaSource {
    Stdin,
    File(PathBuf),
}

impl DeltaSource {
    /// `-` selects standard input, anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

#[derive(Debug)]
pub enum FeedEvent {
    Delta(Delta),
    Malformed { line: usize, error: String },
    Closed,
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    decode_snapshot(&raw).with_context(|| format!("failed to decode snapshot {}", path.display()))
}

/// Starts a reader thread that decodes one JSON delta per line. The channel
/// always ends with `FeedEvent::Closed` unless the receiver went away first.
pub fn spawn_delta_feed(source: DeltaSource) -> Result<Receiver<FeedEvent>> {
    let reader: Box<dyn BufRead + Send> = match &source {
        DeltaSource::Stdin => Box::new(BufReader::new(io::stdin())),
        DeltaSource::File(path) => Box::new(BufReader::new(
            File::open(path)
                .with_context(|| format!("failed to open delta feed {}", path.display()))?,
        )),
    };

    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("delta-feed".to_owned())
        .spawn(move || {
            pump(reader, &tx);
            debug!(?source, "delta feed finished");
        })
        .context("failed to spawn delta feed thread")?;

    Ok(rx)
}

fn pump<R: BufRead>(mut reader: R, tx: &Sender<FeedEvent>) {
    let mut buffer = Vec::new();
    let mut line_number = 0;

    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => line_number += 1,
            Err(error) => {
                warn!(line = line_number + 1, %error, "delta feed read failed");
                break;
            }
        }

        let Some(event) = decode_line(&buffer, line_number) else {
            continue;
        };
        if tx.send(event).is_err() {
            return;
        }
    }

    let _ = tx.send(FeedEvent::Closed);
}

/// Blank lines yield nothing; undecodable bytes become `Malformed`.
fn decode_line(raw: &[u8], line: usize) -> Option<FeedEvent> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text.trim(),
        Err(error) => {
            return Some(FeedEvent::Malformed {
                line,
                error: format!("line is not valid UTF-8: {error}"),
            });
        }
    };
    if text.is_empty() {
        return None;
    }

    Some(match decode_delta(text) {
        Ok(delta) => FeedEvent::Delta(delta),
        Err(error) => FeedEvent::Malformed {
            line,
            error: format!("{error:#}"),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    fn drain(rx: &Receiver<FeedEvent>) -> Vec<FeedEvent> {
        rx.iter().collect()
    }

    #[test]
    fn pump_decodes_lines_and_reports_bad_ones() {
        let input = concat!(
            "{\"channelCloses\": [{\"channelId\": \"1\"}]}\n",
            "\n",
            "{broken\n",
            "{\"nodeUpdates\": [{\"pubkey\": \"02aa\", \"alias\": \"alice\", \"color\": \"#fff\"}]}\n",
        );
        let (tx, rx) = mpsc::channel();
        pump(Cursor::new(input), &tx);
        drop(tx);

        let events = drain(&rx);
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], FeedEvent::Delta(delta) if delta.link_removals == ["1"]));
        assert!(matches!(&events[1], FeedEvent::Malformed { line: 3, .. }));
        assert!(matches!(&events[2], FeedEvent::Delta(delta) if delta.node_upserts.len() == 1));
        assert!(matches!(events[3], FeedEvent::Closed));
    }

    #[test]
    fn invalid_utf8_line_is_skipped_and_feed_continues() {
        let mut input = b"{\"channelCloses\": [{\"channelId\": \"1\"}]}\n".to_vec();
        input.extend_from_slice(b"{\"nodeUpdates\": [{\"pubkey\": \"02\xff\xfe\"}]}\n");
        input.extend_from_slice(b"{\"channelCloses\": [{\"channelId\": \"2\"}]}\n");
        let (tx, rx) = mpsc::channel();
        pump(Cursor::new(input), &tx);
        drop(tx);

        let events = drain(&rx);
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], FeedEvent::Delta(delta) if delta.link_removals == ["1"]));
        assert!(
            matches!(&events[1], FeedEvent::Malformed { line: 2, error } if error.contains("UTF-8"))
        );
        assert!(matches!(&events[2], FeedEvent::Delta(delta) if delta.link_removals == ["2"]));
        assert!(matches!(events[3], FeedEvent::Closed));
    }

    #[test]
    fn last_line_without_newline_is_decoded() {
        let (tx, rx) = mpsc::channel();
        pump(Cursor::new("{\"channelCloses\": [{\"channelId\": 7}]}"), &tx);
        drop(tx);

        let events = drain(&rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], FeedEvent::Delta(delta) if delta.link_removals == ["7"]));
    }

    #[test]
    fn pump_stops_when_receiver_is_gone() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        pump(Cursor::new("{}\n{}\n"), &tx);
    }

    #[test]
    fn file_feed_runs_on_background_thread() {
        let path = std::env::temp_dir().join(format!("netgraph-feed-{}.jsonl", std::process::id()));
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{{\"channelCloses\": [{{\"channelId\": \"9\"}}]}}").unwrap();
        drop(file);

        let rx = spawn_delta_feed(DeltaSource::File(path.clone())).unwrap();
        let events = drain(&rx);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], FeedEvent::Closed));
    }

    #[test]
    fn missing_feed_file_fails_up_front() {
        let missing = DeltaSource::from_arg("/definitely/not/here.jsonl");
        assert!(spawn_delta_feed(missing).is_err());
        assert_eq!(DeltaSource::from_arg("-"), DeltaSource::Stdin);
    }

    #[test]
    fn snapshot_file_errors_name_the_path() {
        let error = load_snapshot(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{error:#}").contains("/definitely/not/here.json"));
    }
}
