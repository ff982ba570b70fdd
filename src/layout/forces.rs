use eframe::egui::{Vec2, vec2};

use super::quadtree::{Cell, QuadTree};

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Charge strength already multiplied by alpha. Negative repels.
    pub(super) strength: f32,
    pub(super) distance_min_sq: f32,
    pub(super) distance_max_sq: f32,
    pub(super) theta: f32,
}

/// Spring between two body indices, with the degree-derived weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Spring {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    pub(super) bias: f32,
}

/// Deterministic unit direction for bodies sitting on the same spot. Antisymmetric
/// in (from, to) so coincident pairs push apart.
fn jiggle(from: usize, to: usize) -> Vec2 {
    let (low, high) = (from.min(to), from.max(to));
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214) * std::f32::consts::TAU;
    let direction = vec2(angle.cos(), angle.sin());
    if from <= to { direction } else { -direction }
}

/// Velocity change on a body caused by `weight` bodies centred `delta` away.
fn charge_from(delta: Vec2, weight: f32, params: ChargeParams) -> Vec2 {
    let mut distance_sq = delta.length_sq();
    if distance_sq >= params.distance_max_sq {
        return Vec2::ZERO;
    }
    if distance_sq < params.distance_min_sq {
        distance_sq = (params.distance_min_sq * distance_sq).sqrt();
    }
    delta * (params.strength * weight / distance_sq)
}

fn charge_between(index: usize, other: usize, positions: &[Vec2], params: ChargeParams) -> Vec2 {
    let mut delta = positions[other] - positions[index];
    if delta.length_sq() <= 1e-12 {
        delta = jiggle(index, other) * 1e-3;
    }
    charge_from(delta, 1.0, params)
}

pub(super) fn accumulate_charge(
    tree: &QuadTree,
    cell: &Cell,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    velocity: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    if cell.bounds.distance_sq_to_point(point) >= params.distance_max_sq {
        return;
    }

    if cell.is_leaf() {
        for &other in tree.bodies(cell) {
            if other != index {
                *velocity += charge_between(index, other, positions, params);
            }
        }
        return;
    }

    let delta = cell.center_of_mass - point;
    let distance = delta.length().max(1e-6);
    let can_approximate =
        !cell.bounds.contains(point) && (cell.bounds.side_length() / distance) < params.theta;

    if can_approximate {
        *velocity += charge_from(delta, cell.mass, params);
        return;
    }

    for child in tree.children(cell) {
        accumulate_charge(tree, child, index, positions, params, velocity);
    }
}

/// Translates every position so the centroid sits at the origin.
pub(super) fn center_positions(positions: &mut [Vec2]) -> Vec2 {
    if positions.is_empty() {
        return Vec2::ZERO;
    }

    let centroid = positions.iter().fold(Vec2::ZERO, |sum, p| sum + *p) / positions.len() as f32;
    for position in positions.iter_mut() {
        *position -= centroid;
    }
    centroid
}

/// Independent x/y pulls toward the origin.
pub(super) fn axis_pull(position: Vec2, strength: f32) -> Vec2 {
    -position * strength
}

/// Applies one spring using the predicted positions (`position + velocity`).
pub(super) fn apply_spring(
    spring: Spring,
    positions: &[Vec2],
    velocities: &mut [Vec2],
    rest_length: f32,
    alpha: f32,
) {
    let Spring {
        source,
        target,
        strength,
        bias,
    } = spring;

    let mut delta =
        (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
    if delta.length_sq() <= 1e-12 {
        delta = jiggle(source, target) * 1e-3;
    }

    let length = delta.length();
    let stretch = (length - rest_length) / length * alpha * strength;
    let correction = delta * stretch;

    velocities[target] -= correction * bias;
    velocities[source] += correction * (1.0 - bias);
}
