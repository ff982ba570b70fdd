mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::graph::{Link, Node};
use crate::util::stable_pair;

use forces::{ChargeParams, Spring, accumulate_charge, apply_spring, axis_pull, center_positions};
use quadtree::QuadTree;

/// Golden angle used for the phyllotaxis seeding spiral.
const SEED_ANGLE: f32 = 2.399_963;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    pub charge_strength: f32,
    pub distance_min: f32,
    pub distance_max: f32,
    pub theta: f32,
    pub axis_strength: f32,
    pub link_distance: f32,
    pub link_alpha_floor: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
    pub velocity_decay: f32,
    pub seed_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min: f32 = 0.001;
        Self {
            charge_strength: -200.0,
            distance_min: 1.0,
            distance_max: 1000.0,
            theta: 0.9,
            axis_strength: 0.1,
            link_distance: 100.0,
            link_alpha_floor: alpha_min,
            alpha_min,
            // Reaches alpha_min from 1.0 in roughly 300 ticks.
            alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
            velocity_decay: 0.4,
            seed_radius: 10.0,
        }
    }
}

#[derive(Clone, Debug)]
struct Body {
    id: String,
    position: Vec2,
    velocity: Vec2,
}

#[derive(Default)]
struct LayoutScratch {
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
}

/// Read-only view over the simulated positions handed to tick callbacks.
#[derive(Clone, Copy)]
pub struct PositionView<'a> {
    bodies: &'a [Body],
    index_by_id: &'a HashMap<String, usize>,
}

impl<'a> PositionView<'a> {
    pub fn get(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.bodies[index].position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Vec2)> + 'a {
        self.bodies
            .iter()
            .map(|body| (body.id.as_str(), body.position))
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Continuous charge/spring simulation stepped explicitly by its host.
pub struct LayoutEngine {
    config: LayoutConfig,
    bodies: Vec<Body>,
    index_by_id: HashMap<String, usize>,
    springs: Vec<Spring>,
    alpha: f32,
    running: bool,
    scratch: LayoutScratch,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            index_by_id: HashMap::new(),
            springs: Vec::new(),
            alpha: 0.0,
            running: false,
            scratch: LayoutScratch::default(),
        }
    }

    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.bodies[index].position)
    }

    pub fn velocity(&self, id: &str) -> Option<Vec2> {
        self.index_by_id
            .get(id)
            .map(|&index| self.bodies[index].velocity)
    }

    pub fn positions(&self) -> PositionView<'_> {
        PositionView {
            bodies: &self.bodies,
            index_by_id: &self.index_by_id,
        }
    }

    /// Rebuilds the body and spring sets from the model. Bodies that already
    /// exist keep their position and velocity; new ones are seeded near the
    /// origin. Re-energizes the simulation.
    pub fn reseed(&mut self, nodes: &[Node], links: &[Link]) {
        let mut prior = std::mem::take(&mut self.bodies)
            .into_iter()
            .map(|body| (body.id.clone(), body))
            .collect::<HashMap<_, _>>();

        let mut bodies = Vec::with_capacity(nodes.len());
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if index_by_id.contains_key(&node.id) {
                continue;
            }
            let body = prior
                .remove(&node.id)
                .unwrap_or_else(|| self.seed_body(&node.id, bodies.len()));
            index_by_id.insert(node.id.clone(), bodies.len());
            bodies.push(body);
        }

        self.bodies = bodies;
        self.index_by_id = index_by_id;
        self.springs = self.build_springs(links);
        self.reheat();
    }

    /// Restores full energy without touching the body set.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.running = !self.bodies.is_empty();
    }

    /// Cancels the loop and releases every body.
    pub fn stop(&mut self) {
        self.running = false;
        self.alpha = 0.0;
        self.bodies = Vec::new();
        self.index_by_id = HashMap::new();
        self.springs = Vec::new();
        self.scratch = LayoutScratch::default();
    }

    /// Advances the simulation by one step and hands the new positions to
    /// `on_tick`. Returns false, without calling back, while at rest.
    pub fn tick<F>(&mut self, on_tick: F) -> bool
    where
        F: FnOnce(PositionView<'_>),
    {
        if !self.running {
            return false;
        }

        self.alpha += (0.0 - self.alpha) * self.config.alpha_decay;
        self.step_forces();
        on_tick(self.positions());

        if self.alpha < self.config.alpha_min {
            self.running = false;
        }
        true
    }

    fn seed_body(&self, id: &str, index: usize) -> Body {
        let radius = self.config.seed_radius * (0.5 + index as f32).sqrt();
        let angle = index as f32 * SEED_ANGLE;
        let (jx, jy) = stable_pair(id);
        let jitter = vec2(jx, jy) * (self.config.seed_radius * 0.5);

        Body {
            id: id.to_owned(),
            position: vec2(angle.cos(), angle.sin()) * radius + jitter,
            velocity: Vec2::ZERO,
        }
    }

    fn build_springs(&self, links: &[Link]) -> Vec<Spring> {
        let mut endpoints = Vec::with_capacity(links.len());
        let mut degree = vec![0usize; self.bodies.len()];
        for link in links {
            let (Some(&source), Some(&target)) = (
                self.index_by_id.get(&link.source_id),
                self.index_by_id.get(&link.target_id),
            ) else {
                continue;
            };
            if source == target {
                continue;
            }
            degree[source] += 1;
            degree[target] += 1;
            endpoints.push((source, target));
        }

        endpoints
            .into_iter()
            .map(|(source, target)| {
                let (source_degree, target_degree) = (degree[source] as f32, degree[target] as f32);
                Spring {
                    source,
                    target,
                    strength: 1.0 / source_degree.min(target_degree),
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect()
    }

    fn step_forces(&mut self) {
        let config = self.config;
        let alpha = self.alpha;

        let LayoutScratch {
            positions,
            velocities,
        } = &mut self.scratch;
        positions.clear();
        velocities.clear();
        for body in &self.bodies {
            positions.push(body.position);
            velocities.push(body.velocity);
        }

        if let Some(tree) = QuadTree::build(positions.as_slice()) {
            let params = ChargeParams {
                strength: config.charge_strength * alpha,
                distance_min_sq: config.distance_min * config.distance_min,
                distance_max_sq: config.distance_max * config.distance_max,
                theta: config.theta,
            };
            for (index, velocity) in velocities.iter_mut().enumerate() {
                accumulate_charge(&tree, tree.root(), index, positions.as_slice(), params, velocity);
            }
        }

        center_positions(positions.as_mut_slice());

        let axis_strength = config.axis_strength * alpha;
        for (position, velocity) in positions.iter().zip(velocities.iter_mut()) {
            *velocity += axis_pull(*position, axis_strength);
        }

        if alpha > config.link_alpha_floor {
            for &spring in &self.springs {
                apply_spring(
                    spring,
                    positions.as_slice(),
                    velocities.as_mut_slice(),
                    config.link_distance,
                    alpha,
                );
            }
        }

        let retain = 1.0 - config.velocity_decay;
        for ((body, position), velocity) in self
            .bodies
            .iter_mut()
            .zip(positions.iter())
            .zip(velocities.iter())
        {
            body.velocity = *velocity * retain;
            body.position = *position + body.velocity;
        }
    }
}
