use std::ops::Range;

use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

/// Axis-aligned square cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    /// Smallest square (padded by one unit) around `points`; `None` when empty
    /// or non-finite.
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(min, max), point| (min.min(*point), max.max(*point)));
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }

        Some(Self {
            center: (min + max) * 0.5,
            half_extent: (max - min).max_elem().max(1.0) * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    /// Squared distance from `point` to the nearest edge of the cell, zero inside.
    pub(super) fn distance_sq_to_point(self, point: Vec2) -> f32 {
        let outside = ((point - self.center).abs() - Vec2::splat(self.half_extent)).max(Vec2::ZERO);
        outside.length_sq()
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    /// Quadrant index: bit 0 is east, bit 1 is south.
    fn quadrant_for(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign = |bit: usize| if quadrant & bit == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign(1), sign(2)) * quarter,
            half_extent: quarter,
        }
    }
}

/// One cell of the tree. `bodies` indexes the tree's permuted body order, so
/// every cell owns a contiguous run of it.
pub(super) struct Cell {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    bodies: Range<usize>,
    children: [Option<usize>; 4],
}

impl Cell {
    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

/// Barnes–Hut tree stored as a flat arena. Cell 0 is the root.
pub(super) struct QuadTree {
    cells: Vec<Cell>,
    order: Vec<usize>,
}

impl QuadTree {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        let mut tree = Self {
            cells: Vec::new(),
            order: (0..positions.len()).collect(),
        };
        tree.subdivide(bounds, 0..positions.len(), positions, 0);
        Some(tree)
    }

    pub(super) fn root(&self) -> &Cell {
        &self.cells[0]
    }

    /// Body indices below `cell`; only leaves are visited body by body.
    pub(super) fn bodies(&self, cell: &Cell) -> &[usize] {
        &self.order[cell.bodies.clone()]
    }

    pub(super) fn children<'a>(&'a self, cell: &'a Cell) -> impl Iterator<Item = &'a Cell> + 'a {
        cell.children.iter().flatten().map(|&child| &self.cells[child])
    }

    fn subdivide(&mut self, bounds: QuadBounds, span: Range<usize>, positions: &[Vec2], depth: usize) -> usize {
        let slot = self.cells.len();
        let mass = span.len() as f32;
        let sum = self.order[span.clone()]
            .iter()
            .fold(Vec2::ZERO, |sum, &body| sum + positions[body]);
        self.cells.push(Cell {
            bounds,
            center_of_mass: sum / mass.max(1.0),
            mass,
            bodies: span.clone(),
            children: [None; 4],
        });

        if depth >= MAX_DEPTH || span.len() <= LEAF_CAPACITY {
            return slot;
        }

        let mut counts = [0usize; 4];
        for &body in &self.order[span.clone()] {
            counts[bounds.quadrant_for(positions[body])] += 1;
        }
        // Coincident bodies land in one quadrant forever; keep them as a leaf.
        if counts.iter().filter(|&&count| count > 0).count() <= 1 {
            return slot;
        }

        self.order[span.clone()].sort_by_key(|&body| bounds.quadrant_for(positions[body]));
        let mut start = span.start;
        for (quadrant, count) in counts.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            let child = self.subdivide(bounds.quadrant(quadrant), start..start + count, positions, depth + 1);
            self.cells[slot].children[quadrant] = Some(child);
            start += count;
        }
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_bodies(tree: &QuadTree, cell: &Cell, out: &mut Vec<usize>) {
        if cell.is_leaf() {
            out.extend_from_slice(tree.bodies(cell));
            return;
        }
        for child in tree.children(cell) {
            leaf_bodies(tree, child, out);
        }
    }

    #[test]
    fn empty_input_builds_nothing() {
        assert!(QuadTree::build(&[]).is_none());
    }

    #[test]
    fn every_body_lands_in_exactly_one_leaf() {
        let positions = (0..100)
            .map(|index| vec2((index % 10) as f32 * 13.0, (index / 10) as f32 * 7.0))
            .collect::<Vec<_>>();
        let tree = QuadTree::build(&positions).unwrap();
        let root = tree.root();

        assert_eq!(root.mass, 100.0);
        assert!(!root.is_leaf());

        let mut seen = Vec::new();
        leaf_bodies(&tree, root, &mut seen);
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
        for position in &positions {
            assert!(root.bounds.contains(*position));
        }
    }

    #[test]
    fn children_partition_their_parent() {
        let positions = (0..40)
            .map(|index| vec2((index * 37 % 101) as f32, (index * 53 % 97) as f32))
            .collect::<Vec<_>>();
        let tree = QuadTree::build(&positions).unwrap();

        for cell in &tree.cells {
            if cell.is_leaf() {
                continue;
            }
            let child_mass = tree.children(cell).map(|child| child.mass).sum::<f32>();
            assert_eq!(child_mass, cell.mass);
            for child in tree.children(cell) {
                for &body in tree.bodies(child) {
                    assert!(child.bounds.contains(positions[body]));
                }
            }
        }
    }

    #[test]
    fn coincident_bodies_stay_in_one_leaf() {
        let positions = vec![vec2(5.0, 5.0); 20];
        let tree = QuadTree::build(&positions).unwrap();

        assert!(tree.root().is_leaf());
        assert_eq!(tree.bodies(tree.root()).len(), 20);
        assert_eq!(tree.root().center_of_mass, vec2(5.0, 5.0));
    }

    #[test]
    fn quadrants_tile_the_cell() {
        let bounds = QuadBounds {
            center: Vec2::ZERO,
            half_extent: 8.0,
        };

        for quadrant in 0..4 {
            let child = bounds.quadrant(quadrant);
            assert_eq!(child.half_extent, 4.0);
            assert_eq!(bounds.quadrant_for(child.center), quadrant);
        }
    }

    #[test]
    fn distance_to_cell_is_zero_inside() {
        let bounds = QuadBounds {
            center: Vec2::ZERO,
            half_extent: 10.0,
        };

        assert_eq!(bounds.distance_sq_to_point(vec2(3.0, -4.0)), 0.0);
        assert_eq!(bounds.distance_sq_to_point(vec2(13.0, 0.0)), 9.0);
        assert_eq!(bounds.distance_sq_to_point(vec2(13.0, 14.0)), 25.0);
    }
}
