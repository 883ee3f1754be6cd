use std::collections::VecDeque;

use super::inputs::*;

pub const UNREACHABLE: i32 = i32::MAX;

/// Minimum extraction-cost distances from one source cell to every cell.
/// Leaving a cell costs one turn plus the halite burned moving off it.
pub struct CostField {
    source: usize,
    distances: Box<[i32]>,
    steps: Box<[i32]>,
    parents: Box<[Option<usize>]>,
}
impl CostField {
    pub fn generate(source: usize, grid: &Grid, rules: &Rules, is_blocked: impl Fn(usize) -> bool) -> Self {
        let num_cells = grid.num_cells();
        let mut distances = vec![UNREACHABLE; num_cells];
        let mut steps = vec![UNREACHABLE; num_cells];
        let mut parents = vec![None; num_cells];
        let mut queued = vec![false; num_cells];

        distances[source] = 0;
        steps[source] = 0;

        let mut frontier = Vec::with_capacity(num_cells);
        let mut next = Vec::with_capacity(num_cells);
        next.push(source);

        // Relaxation converges well before this; the cap only bounds pathological grids
        let max_passes = num_cells.max(1);
        let mut passes = 0;
        while !next.is_empty() && passes < max_passes {
            std::mem::swap(&mut frontier, &mut next);
            next.clear();
            passes += 1;

            for &cell in frontier.iter() {
                queued[cell] = false;
            }

            for &cell in frontier.iter() {
                if cell != source && is_blocked(cell) { continue } // may be entered, never crossed

                let neighbor_distance = distances[cell] + 1 + grid.move_cost(cell, rules);
                let neighbor_steps = steps[cell] + 1;
                for n in grid.neighbors(cell) {
                    let improves =
                        neighbor_distance < distances[n]
                        || (neighbor_distance == distances[n] && neighbor_steps < steps[n]);
                    if improves {
                        distances[n] = neighbor_distance;
                        steps[n] = neighbor_steps;
                        parents[n] = Some(cell);
                        if !queued[n] {
                            queued[n] = true;
                            next.push(n);
                        }
                    }
                }
            }
        }

        Self {
            source,
            distances: distances.into_boxed_slice(),
            steps: steps.into_boxed_slice(),
            parents: parents.into_boxed_slice(),
        }
    }

    pub fn source(&self) -> usize { self.source }

    pub fn distance_to(&self, cell: usize) -> i32 { self.distances[cell] }

    pub fn steps_to(&self, cell: usize) -> i32 { self.steps[cell] }

    pub fn is_reachable(&self, cell: usize) -> bool { self.distances[cell] != UNREACHABLE }

    pub fn halite_burned(&self, cell: usize) -> i32 {
        if !self.is_reachable(cell) { return UNREACHABLE }
        self.distances[cell] - self.steps[cell]
    }

    /// Source-to-destination cells, both inclusive. None if the predecessor chain breaks.
    pub fn path_to(&self, dest: usize) -> Option<Vec<usize>> {
        let mut path = vec![dest];
        let mut current = dest;
        for _ in 0..self.parents.len() {
            if current == self.source {
                path.reverse();
                return Some(path);
            }
            current = self.parents[current]?;
            path.push(current);
        }
        None
    }

    /// The neighbor of the source on the cheapest path to `dest`
    pub fn first_step(&self, dest: usize) -> Option<usize> {
        if dest == self.source { return Some(self.source) }
        let mut current = dest;
        for _ in 0..self.parents.len() {
            let parent = self.parents[current]?;
            if parent == self.source { return Some(current) }
            current = parent;
        }
        None
    }
}

/// Greedy maximizing field: for every cell, the richest halite sum collectable
/// along a shortest-step route from the source.
pub struct RewardField {
    rewards: Box<[i64]>,
    depths: Box<[i32]>,
}
impl RewardField {
    pub fn generate(source: usize, grid: &Grid, max_depth: i32) -> Self {
        let num_cells = grid.num_cells();
        let mut rewards = vec![0i64; num_cells];
        let mut depths = vec![UNREACHABLE; num_cells];

        rewards[source] = grid.halite_at(source) as i64;
        depths[source] = 0;

        let mut layer = vec![source];
        let mut next = Vec::new();
        let mut depth = 0;
        while !layer.is_empty() && depth < max_depth {
            next.clear();
            for &cell in layer.iter() {
                for n in grid.neighbors(cell) {
                    let reward = rewards[cell] + grid.halite_at(n) as i64;
                    if depths[n] == UNREACHABLE {
                        depths[n] = depth + 1;
                        rewards[n] = reward;
                        next.push(n);
                    } else if depths[n] == depth + 1 && reward > rewards[n] {
                        rewards[n] = reward;
                    }
                }
            }
            std::mem::swap(&mut layer, &mut next);
            depth += 1;
        }

        Self {
            rewards: rewards.into_boxed_slice(),
            depths: depths.into_boxed_slice(),
        }
    }

    pub fn reward(&self, cell: usize) -> i64 { self.rewards[cell] }

    /// Halite per cell along the richest route, 0 beyond the horizon
    pub fn richness(&self, cell: usize) -> f64 {
        let depth = self.depths[cell];
        if depth == UNREACHABLE { return 0.0 }
        self.rewards[cell] as f64 / (depth + 1) as f64
    }
}

/// Multi-source BFS recording, for every cell, the nearest source and its step distance
pub struct NearestMap {
    distance_to_nearest: Box<[i32]>,
    nearest: Box<[Option<usize>]>,
}
impl NearestMap {
    pub fn generate(grid: &Grid, sources: &[usize]) -> Self {
        let num_cells = grid.num_cells();
        let mut distance_to_nearest = vec![UNREACHABLE; num_cells];
        let mut nearest = vec![None; num_cells];

        let mut queue = VecDeque::new();
        for (label, &cell) in sources.iter().enumerate() {
            if distance_to_nearest[cell] == 0 { continue }
            distance_to_nearest[cell] = 0;
            nearest[cell] = Some(label);
            queue.push_back(cell);
        }

        while let Some(current) = queue.pop_front() {
            let neighbor_distance = distance_to_nearest[current] + 1;
            for n in grid.neighbors(current) {
                if neighbor_distance < distance_to_nearest[n] {
                    distance_to_nearest[n] = neighbor_distance;
                    nearest[n] = nearest[current];
                    queue.push_back(n);
                }
            }
        }

        Self {
            distance_to_nearest: distance_to_nearest.into_boxed_slice(),
            nearest: nearest.into_boxed_slice(),
        }
    }

    pub fn distance_to(&self, cell: usize) -> i32 { self.distance_to_nearest[cell] }

    /// Index into the source list the map was generated from
    pub fn nearest(&self, cell: usize) -> Option<usize> { self.nearest[cell] }
}

/// Directions that shorten the toroidal distance, dominant axis first.
/// Used whenever a reconstructed path is unavailable.
pub fn direct_moves(grid: &Grid, from: usize, to: usize) -> Vec<Direction> {
    let source = grid.position(from);
    let target = grid.position(to);
    if source == target { return vec![Direction::Still] }

    let dx = (source.x - target.x).abs();
    let dy = (source.y - target.y).abs();
    let wrapped_dx = grid.width - dx;
    let wrapped_dy = grid.height - dy;

    let mut moves = Vec::with_capacity(2);
    let steps_x = dx.min(wrapped_dx);
    let steps_y = dy.min(wrapped_dy);
    if source.x < target.x {
        moves.push(if dx > wrapped_dx { Direction::West } else { Direction::East });
    } else if source.x > target.x {
        moves.push(if dx < wrapped_dx { Direction::West } else { Direction::East });
    }

    if source.y < target.y {
        moves.push(if dy > wrapped_dy { Direction::North } else { Direction::South });
    } else if source.y > target.y {
        moves.push(if dy < wrapped_dy { Direction::North } else { Direction::South });
    }

    if steps_y > steps_x && moves.len() >= 2 {
        moves.swap(0, 1);
    }
    moves
}

/// First move towards `dest`: along the field's cheapest path when it exists,
/// otherwise straight along the toroidal vector.
pub fn first_move(field: &CostField, grid: &Grid, dest: usize) -> Direction {
    let from = field.source();
    field.first_step(dest)
        .and_then(|next| grid.direction_between(from, next))
        .unwrap_or_else(|| {
            tracing::warn!(from = from, dest = dest, "no reconstructed path, falling back to direct move");
            direct_moves(grid, from, dest)[0]
        })
}
