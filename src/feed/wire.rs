use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::graph::{Delta, LinkSpec, NodeSpec};

/// Initial node/link collection decoded from the network daemon's graph dump.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub nodes: Vec<NodeSpec>,
    pub links: Vec<LinkSpec>,
}

#[derive(Deserialize)]
struct RawNode {
    pubkey: String,
    #[serde(default)]
    alias: String,
    #[serde(default)]
    color: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChannel {
    #[serde(deserialize_with = "id_string")]
    channel_id: String,
    node1_pub_key: String,
    node2_pub_key: String,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    channels: Vec<RawChannel>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChannelUpdate {
    #[serde(deserialize_with = "id_string")]
    channel_id: String,
    node_id1: String,
    node_id2: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChannelClose {
    #[serde(deserialize_with = "id_string")]
    channel_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGraphUpdate {
    #[serde(default)]
    node_updates: Vec<RawNode>,
    #[serde(default)]
    channel_updates: Vec<RawChannelUpdate>,
    #[serde(default)]
    channel_closes: Vec<RawChannelClose>,
}

/// Channel ids arrive either as JSON strings or as bare 64-bit numbers.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

impl From<RawNode> for NodeSpec {
    fn from(raw: RawNode) -> Self {
        Self {
            id: raw.pubkey,
            label: raw.alias,
            color: raw.color,
        }
    }
}

pub fn decode_snapshot(raw: &str) -> Result<Snapshot> {
    let parsed: RawSnapshot = serde_json::from_str(raw).context("invalid graph snapshot JSON")?;

    Ok(Snapshot {
        nodes: parsed.nodes.into_iter().map(NodeSpec::from).collect(),
        links: parsed
            .channels
            .into_iter()
            .map(|channel| LinkSpec {
                id: channel.channel_id,
                source_id: channel.node1_pub_key,
                target_id: channel.node2_pub_key,
            })
            .collect(),
    })
}

pub fn decode_delta(raw: &str) -> Result<Delta> {
    let parsed: RawGraphUpdate = serde_json::from_str(raw).context("invalid graph update JSON")?;

    Ok(Delta {
        node_upserts: parsed.node_updates.into_iter().map(NodeSpec::from).collect(),
        link_upserts: parsed
            .channel_updates
            .into_iter()
            .map(|update| LinkSpec {
                id: update.channel_id,
                source_id: update.node_id1,
                target_id: update.node_id2,
            })
            .collect(),
        link_removals: parsed
            .channel_closes
            .into_iter()
            .map(|close| close.channel_id)
            .collect(),
    })
}
