use std::collections::HashMap;

use super::error::GraphError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSpec {
    pub id: String,
    pub label: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSpec {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
}

/// Incremental update. The three lists are applied in field order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Delta {
    pub node_upserts: Vec<NodeSpec>,
    pub link_upserts: Vec<LinkSpec>,
    pub link_removals: Vec<String>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.node_upserts.is_empty() && self.link_upserts.is_empty() && self.link_removals.is_empty()
    }
}

/// Display attributes of a peer. Positions live in the layout engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub color: String,
}

/// Links are immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeltaReport {
    pub nodes_inserted: usize,
    pub nodes_updated: usize,
    pub links_inserted: usize,
    pub links_unchanged: usize,
    pub links_removed: usize,
    pub rejected: Vec<GraphError>,
}

impl DeltaReport {
    /// True when the node or link sets changed shape (not just attributes).
    pub fn changed_topology(&self) -> bool {
        self.nodes_inserted > 0 || self.links_inserted > 0 || self.links_removed > 0
    }
}

#[derive(Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    links: Vec<Link>,
    link_index: HashMap<String, usize>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all state. On error the model keeps whatever it held before.
    pub fn load_snapshot(&mut self, nodes: Vec<NodeSpec>, links: Vec<LinkSpec>) -> Result<(), GraphError> {
        let mut next = Self::default();
        for spec in nodes {
            next.upsert_node(spec);
        }

        for spec in links {
            if next.link_index.contains_key(&spec.id) {
                continue;
            }
            if let Some(missing) = next.missing_endpoint(&spec) {
                return Err(GraphError::InvalidSnapshot {
                    missing_node_id: missing.to_owned(),
                    link_id: spec.id,
                });
            }
            next.insert_link(spec);
        }

        *self = next;
        Ok(())
    }

    /// Applies one delta. Dangling link upserts are skipped and reported; they
    /// never abort the remainder of the delta.
    pub fn apply_delta(&mut self, delta: Delta) -> DeltaReport {
        let mut report = DeltaReport::default();

        for spec in delta.node_upserts {
            if self.upsert_node(spec) {
                report.nodes_inserted += 1;
            } else {
                report.nodes_updated += 1;
            }
        }

        for spec in delta.link_upserts {
            if self.link_index.contains_key(&spec.id) {
                report.links_unchanged += 1;
                continue;
            }
            if let Some(missing) = self.missing_endpoint(&spec) {
                report.rejected.push(GraphError::DanglingLink {
                    missing_node_id: missing.to_owned(),
                    link_id: spec.id,
                });
                continue;
            }
            self.insert_link(spec);
            report.links_inserted += 1;
        }

        for id in delta.link_removals {
            if self.remove_link(&id) {
                report.links_removed += 1;
            }
        }

        report
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&index| &self.nodes[index])
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.link_index.get(id).map(|&index| &self.links[index])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_link(&self, id: &str) -> bool {
        self.link_index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn degree(&self, id: &str) -> usize {
        self.links
            .iter()
            .filter(|link| link.source_id == id || link.target_id == id)
            .count()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns true when a new node was inserted.
    fn upsert_node(&mut self, spec: NodeSpec) -> bool {
        if let Some(&index) = self.node_index.get(&spec.id) {
            let node = &mut self.nodes[index];
            node.label = spec.label;
            node.color = spec.color;
            return false;
        }

        self.node_index.insert(spec.id.clone(), self.nodes.len());
        self.nodes.push(Node {
            id: spec.id,
            label: spec.label,
            color: spec.color,
        });
        true
    }

    fn missing_endpoint<'a>(&self, spec: &'a LinkSpec) -> Option<&'a str> {
        [spec.source_id.as_str(), spec.target_id.as_str()]
            .into_iter()
            .find(|id| !self.node_index.contains_key(*id))
    }

    fn insert_link(&mut self, spec: LinkSpec) {
        self.link_index.insert(spec.id.clone(), self.links.len());
        self.links.push(Link {
            id: spec.id,
            source_id: spec.source_id,
            target_id: spec.target_id,
        });
    }

    /// Swap-removes, so only the link moved into the hole needs a new index.
    fn remove_link(&mut self, id: &str) -> bool {
        let Some(index) = self.link_index.remove(id) else {
            return false;
        };

        self.links.swap_remove(index);
        if let Some(moved) = self.links.get(index)
            && let Some(entry) = self.link_index.get_mut(&moved.id)
        {
            *entry = index;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeSpec {
        NodeSpec {
            id: id.to_owned(),
            label: format!("{id}-alias"),
            color: "#3399ff".to_owned(),
        }
    }

    fn link(id: &str, source: &str, target: &str) -> LinkSpec {
        LinkSpec {
            id: id.to_owned(),
            source_id: source.to_owned(),
            target_id: target.to_owned(),
        }
    }

    fn node_ids(model: &GraphModel) -> Vec<String> {
        model.nodes().iter().map(|node| node.id.clone()).collect()
    }

    fn link_ids(model: &GraphModel) -> Vec<String> {
        model.links().iter().map(|link| link.id.clone()).collect()
    }

    fn seeded() -> GraphModel {
        let mut model = GraphModel::new();
        model
            .load_snapshot(vec![node("A"), node("B")], vec![link("L1", "A", "B")])
            .unwrap();
        model
    }

    #[test]
    fn snapshot_replaces_previous_state() {
        let mut model = seeded();
        model.load_snapshot(vec![node("X")], Vec::new()).unwrap();

        assert_eq!(node_ids(&model), vec!["X"]);
        assert_eq!(model.link_count(), 0);
        assert!(!model.contains_node("A"));
    }

    #[test]
    fn invalid_snapshot_on_empty_model_leaves_it_empty() {
        let mut model = GraphModel::new();
        let error = model
            .load_snapshot(vec![node("A")], vec![link("L1", "A", "Z")])
            .unwrap_err();

        assert_eq!(
            error,
            GraphError::InvalidSnapshot {
                link_id: "L1".to_owned(),
                missing_node_id: "Z".to_owned(),
            }
        );
        assert_eq!(model.node_count(), 0);
        assert_eq!(model.link_count(), 0);
    }

    #[test]
    fn invalid_snapshot_keeps_prior_state() {
        let mut model = seeded();
        let result = model.load_snapshot(
            vec![node("C"), node("D")],
            vec![link("L9", "C", "D"), link("L10", "Q", "D")],
        );

        assert!(matches!(result, Err(GraphError::InvalidSnapshot { .. })));
        assert_eq!(node_ids(&model), vec!["A", "B"]);
        assert_eq!(link_ids(&model), vec!["L1"]);
    }

    #[test]
    fn snapshot_duplicates_merge() {
        let mut model = GraphModel::new();
        let mut renamed = node("A");
        renamed.label = "second".to_owned();
        model
            .load_snapshot(
                vec![node("A"), node("B"), renamed],
                vec![link("L1", "A", "B"), link("L1", "B", "A")],
            )
            .unwrap();

        assert_eq!(model.node_count(), 2);
        assert_eq!(model.node("A").unwrap().label, "second");
        assert_eq!(model.link_count(), 1);
        assert_eq!(model.link("L1").unwrap().source_id, "A");
    }

    #[test]
    fn node_upsert_updates_in_place() {
        let mut model = seeded();
        let report = model.apply_delta(Delta {
            node_upserts: vec![NodeSpec {
                id: "A".to_owned(),
                label: "renamed".to_owned(),
                color: "#ff0000".to_owned(),
            }],
            ..Delta::default()
        });

        assert_eq!(report.nodes_updated, 1);
        assert_eq!(report.nodes_inserted, 0);
        assert!(!report.changed_topology());
        assert_eq!(node_ids(&model), vec!["A", "B"]);
        let updated = model.node("A").unwrap();
        assert_eq!(updated.label, "renamed");
        assert_eq!(updated.color, "#ff0000");
    }

    #[test]
    fn link_upsert_for_existing_id_is_noop() {
        let mut model = seeded();
        model.apply_delta(Delta {
            node_upserts: vec![node("C")],
            ..Delta::default()
        });
        let report = model.apply_delta(Delta {
            link_upserts: vec![link("L1", "B", "C")],
            ..Delta::default()
        });

        assert_eq!(report.links_unchanged, 1);
        let existing = model.link("L1").unwrap();
        assert_eq!(existing.source_id, "A");
        assert_eq!(existing.target_id, "B");
    }

    #[test]
    fn removal_is_idempotent() {
        let mut model = seeded();
        let before_nodes = node_ids(&model);

        let report = model.apply_delta(Delta {
            link_removals: vec!["missing".to_owned()],
            ..Delta::default()
        });
        assert_eq!(report.links_removed, 0);
        assert_eq!(link_ids(&model), vec!["L1"]);

        for _ in 0..3 {
            model.apply_delta(Delta {
                link_removals: vec!["L1".to_owned()],
                ..Delta::default()
            });
            assert_eq!(model.link_count(), 0);
            assert_eq!(node_ids(&model), before_nodes);
        }
    }

    #[test]
    fn dangling_link_is_rejected_locally() {
        let mut model = GraphModel::new();
        let report = model.apply_delta(Delta {
            node_upserts: vec![node("A"), node("B")],
            link_upserts: vec![link("bad", "A", "ghost"), link("good", "A", "B")],
            link_removals: Vec::new(),
        });

        assert_eq!(node_ids(&model), vec!["A", "B"]);
        assert_eq!(link_ids(&model), vec!["good"]);
        assert_eq!(report.links_inserted, 1);
        assert_eq!(
            report.rejected,
            vec![GraphError::DanglingLink {
                link_id: "bad".to_owned(),
                missing_node_id: "ghost".to_owned(),
            }]
        );
    }

    #[test]
    fn removal_keeps_index_consistent() {
        let mut model = GraphModel::new();
        model
            .load_snapshot(
                vec![node("A"), node("B"), node("C")],
                vec![link("L1", "A", "B"), link("L2", "B", "C"), link("L3", "C", "A")],
            )
            .unwrap();

        model.apply_delta(Delta {
            link_removals: vec!["L1".to_owned()],
            ..Delta::default()
        });

        assert_eq!(model.link("L2").unwrap().target_id, "C");
        assert_eq!(model.link("L3").unwrap().target_id, "A");
        model.apply_delta(Delta {
            link_removals: vec!["L3".to_owned()],
            ..Delta::default()
        });
        assert_eq!(link_ids(&model), vec!["L2"]);
        assert_eq!(model.degree("B"), 1);
        assert_eq!(model.degree("A"), 0);
    }

    #[test]
    fn every_index_resolves_after_removals() {
        let mut model = GraphModel::new();
        let ids = (0..8).map(|index| format!("L{index}")).collect::<Vec<_>>();
        model
            .load_snapshot(
                vec![node("A"), node("B")],
                ids.iter().map(|id| link(id, "A", "B")).collect(),
            )
            .unwrap();

        model.apply_delta(Delta {
            link_removals: vec!["L0".to_owned(), "L5".to_owned(), "L7".to_owned()],
            ..Delta::default()
        });

        let mut remaining = link_ids(&model);
        remaining.sort();
        assert_eq!(remaining, vec!["L1", "L2", "L3", "L4", "L6"]);
        for id in &remaining {
            assert_eq!(&model.link(id).unwrap().id, id);
        }
        assert!(model.link("L5").is_none());
        assert_eq!(model.degree("A"), 5);
    }

    #[test]
    fn removed_link_can_be_added_again() {
        let mut model = seeded();
        model.apply_delta(Delta {
            link_removals: vec!["L1".to_owned()],
            ..Delta::default()
        });
        model.apply_delta(Delta {
            link_upserts: vec![link("L1", "B", "A")],
            ..Delta::default()
        });

        assert_eq!(model.link("L1").unwrap().source_id, "B");
    }

    #[test]
    fn scenario_add_then_remove() {
        let mut model = seeded();

        let report = model.apply_delta(Delta {
            node_upserts: vec![node("C")],
            link_upserts: vec![link("L2", "B", "C")],
            link_removals: Vec::new(),
        });
        assert!(report.rejected.is_empty());
        assert_eq!(node_ids(&model), vec!["A", "B", "C"]);
        assert_eq!(link_ids(&model), vec!["L1", "L2"]);

        model.apply_delta(Delta {
            link_removals: vec!["L1".to_owned()],
            ..Delta::default()
        });
        assert_eq!(node_ids(&model), vec!["A", "B", "C"]);
        assert_eq!(link_ids(&model), vec!["L2"]);
    }
}
