use serde::Serialize;

use super::SceneReconciler;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodePlacement {
    pub id: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub fill: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkPlacement {
    pub id: String,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Flat, id-sorted copy of everything the drawing side needs for one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderSurface {
    pub nodes: Vec<NodePlacement>,
    pub links: Vec<LinkPlacement>,
}

impl RenderSurface {
    pub(super) fn collect(scene: &SceneReconciler) -> Self {
        let mut nodes = scene
            .nodes()
            .map(|(id, entry)| NodePlacement {
                id: id.to_owned(),
                label: entry.label.clone(),
                x: entry.placement.x,
                y: entry.placement.y,
                radius: entry.radius(),
                fill: format!(
                    "#{:02x}{:02x}{:02x}",
                    entry.fill.r(),
                    entry.fill.g(),
                    entry.fill.b()
                ),
            })
            .collect::<Vec<_>>();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut links = scene
            .links()
            .map(|(id, entry)| LinkPlacement {
                id: id.to_owned(),
                x1: entry.from.x,
                y1: entry.from.y,
                x2: entry.to.x,
                y2: entry.to.y,
            })
            .collect::<Vec<_>>();
        links.sort_by(|a, b| a.id.cmp(&b.id));

        Self { nodes, links }
    }
}
