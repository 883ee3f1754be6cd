use rand::prelude::*;
use std::time::{Duration, Instant};

use super::danger::DangerMap;
use super::inputs::*;
use super::pathing;
use super::planning::DirectionCosts;

const MAX_TRIALS: u64 = 5000;
const TRIALS_PER_CUBED_STEP: u64 = 100;

/// A walk ends once cargo reaches this fraction of capacity
const FULL_FRACTION: f64 = 0.9;

/// Extra mining rounds tried after the first one on arrival
const EXTRA_ROUNDS: i32 = 6;

/// Base and exponent scale of the regret curve
const REGRET_SCALE: f64 = 100.0;
const REGRET_EXPONENT: f64 = 4.0;

/// Cost of a direction no trial started with
pub const UNSAMPLED_COST: f64 = 1_000_000.0;

pub struct WalkRequest<'a> {
    pub grid: &'a Grid,
    pub rules: &'a Rules,
    pub danger: &'a DangerMap,
    pub inspiration: bool,
    pub start: usize,
    pub destination: usize,
    pub cargo: i32,

    /// Cells at or below this are crossed rather than mined
    pub mine_threshold: i32,
}
impl<'a> WalkRequest<'a> {
    fn multiplier(&self, cell: usize) -> f64 {
        if self.inspiration && self.danger.is_inspired(cell) {
            1.0 + self.rules.inspired_bonus_multiplier
        } else {
            1.0
        }
    }

    fn num_trials(&self) -> u64 {
        let distance = self.grid.cell_distance(self.start, self.destination) as u64;
        TRIALS_PER_CUBED_STEP.saturating_mul(distance.pow(3)).min(MAX_TRIALS).max(1)
    }

    fn step_cap(&self) -> i32 {
        4 * self.grid.cell_distance(self.start, self.destination) + 16
    }
}

#[derive(Clone,Debug)]
pub struct WalkResult {
    pub best_move: Direction,
    pub best_yield: f64,

    /// Best yield-per-turn among trials starting with each direction
    pub per_direction: [Option<f64>; 5],

    pub num_trials: u64,
}

/// Halite levels as changed by one simulated walk
struct Depletion {
    changes: Vec<(usize, i32)>,
}
impl Depletion {
    fn new() -> Self {
        Self { changes: Vec::new() }
    }

    fn halite(&self, grid: &Grid, cell: usize) -> i32 {
        self.changes.iter().find(|(c, _)| *c == cell).map_or(grid.halite_at(cell), |&(_, h)| h)
    }

    fn set(&mut self, cell: usize, halite: i32) {
        match self.changes.iter_mut().find(|(c, _)| *c == cell) {
            Some(change) => change.1 = halite,
            None => self.changes.push((cell, halite)),
        }
    }
}

struct Trial {
    first_move: Direction,
    yield_per_turn: f64,
}

/// Estimates the best first move towards a gathering target by repeated random mine-or-move walks.
/// Stops early when `budget` runs out; at least one trial always runs.
pub fn refine(request: &WalkRequest, rng: &mut StdRng, budget: Duration) -> WalkResult {
    let start_time = Instant::now();

    if request.start == request.destination {
        let halite = request.grid.halite_at(request.start);
        let mined = extraction(halite, request.rules) as f64 * request.multiplier(request.start);
        let mut per_direction = [None; 5];
        per_direction[Direction::Still.index()] = Some(mined);
        return WalkResult {
            best_move: Direction::Still,
            best_yield: mined,
            per_direction,
            num_trials: 0,
        };
    }

    let max_trials = request.num_trials();
    let mut per_direction: [Option<f64>; 5] = [None; 5];
    let mut best: Option<Trial> = None;
    let mut num_trials = 0;
    while num_trials < max_trials {
        if num_trials > 0 && start_time.elapsed() >= budget { break }
        num_trials += 1;

        let trial = walk(request, rng);
        let slot = &mut per_direction[trial.first_move.index()];
        *slot = Some(slot.map_or(trial.yield_per_turn, |y| y.max(trial.yield_per_turn)));

        if best.as_ref().map_or(true, |b| trial.yield_per_turn > b.yield_per_turn) {
            best = Some(trial);
        }
    }

    if num_trials < max_trials {
        tracing::debug!(trials = num_trials, wanted = max_trials, "walk refinement cut short");
    }

    let (best_move, best_yield) = match best {
        Some(trial) => (trial.first_move, trial.yield_per_turn),
        None => (Direction::Still, 0.0),
    };
    WalkResult { best_move, best_yield, per_direction, num_trials }
}

fn walk(request: &WalkRequest, rng: &mut StdRng) -> Trial {
    let grid = request.grid;
    let rules = request.rules;
    let full = (rules.capacity as f64 * FULL_FRACTION) as i32;

    let mut depletion = Depletion::new();
    let mut cell = request.start;
    let mut cargo = request.cargo;
    let mut turns = 0;
    let mut first_move = None;

    let step_cap = request.step_cap();
    while cell != request.destination && turns < step_cap {
        if turns > 0 && cargo >= full { break }

        let mut options = pathing::direct_moves(grid, cell, request.destination);
        options.push(Direction::Still);
        let choice = options[rng.gen_range(0..options.len())];

        let halite = depletion.halite(grid, cell);
        let move_cost = halite / rules.move_cost_ratio;
        let choice =
            if choice == Direction::Still && halite <= request.mine_threshold { options[0] }
            else { choice };
        let direction =
            if choice == Direction::Still || cargo < move_cost {
                cargo = mine(request, &mut depletion, cell, cargo);
                Direction::Still
            } else {
                cargo -= move_cost;
                cell = grid.neighbor(cell, choice);
                choice
            };

        first_move.get_or_insert(direction);
        turns += 1;
    }

    let first_move = first_move.unwrap_or_else(|| pathing::direct_moves(grid, request.start, request.destination)[0]);
    let gained = |cargo: i32| (cargo - request.cargo) as f64;

    if cell != request.destination {
        return Trial { first_move, yield_per_turn: gained(cargo) / turns.max(1) as f64 };
    }

    // Arrived: mine the destination for a few rounds and keep the best rate
    let mut yield_per_turn = f64::MIN;
    for _ in 0..=EXTRA_ROUNDS {
        cargo = mine(request, &mut depletion, cell, cargo);
        turns += 1;
        yield_per_turn = yield_per_turn.max(gained(cargo) / turns as f64);
        if cargo >= rules.capacity { break }
        if depletion.halite(grid, cell) <= request.mine_threshold { break }
    }
    Trial { first_move, yield_per_turn }
}

fn mine(request: &WalkRequest, depletion: &mut Depletion, cell: usize, cargo: i32) -> i32 {
    let halite = depletion.halite(request.grid, cell);
    let take = extraction(halite, request.rules);
    depletion.set(cell, halite - take);

    let gained = (take as f64 * request.multiplier(cell)) as i32;
    (cargo + gained).min(request.rules.capacity)
}

/// Converts walk yields into regret costs: 0 for the best direction, rising steeply as yield falls off
pub fn direction_costs(result: &WalkResult) -> DirectionCosts {
    let mut costs = [UNSAMPLED_COST; 5];
    let best = result.best_yield;
    for direction in Direction::ALL {
        let y = match result.per_direction[direction.index()] {
            Some(y) => y,
            None => continue,
        };

        costs[direction.index()] =
            if direction == result.best_move { 0.0 }
            else if best <= 0.0 { REGRET_SCALE }
            else {
                let exponent = (REGRET_EXPONENT * (1.0 - y / best)).clamp(0.0, REGRET_EXPONENT);
                REGRET_SCALE * (10f64.powf(exponent) - 1.0)
            };
    }
    costs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::fixtures;

    fn danger_for(world: &WorldState) -> DangerMap {
        DangerMap::generate(world, &vec![None; world.grid.num_cells()], false)
    }

    #[test]
    fn zero_budget_still_returns_a_move() {
        let mut world = fixtures::world(16, 16);
        fixtures::set_halite(&mut world, 6, 3, 600);
        let danger = danger_for(&world);
        let request = WalkRequest {
            grid: &world.grid,
            rules: &world.rules,
            danger: &danger,
            inspiration: false,
            start: world.grid.index(Position::new(3, 3)),
            destination: world.grid.index(Position::new(6, 3)),
            cargo: 0,
            mine_threshold: 10,
        };

        let mut rng = StdRng::seed_from_u64(7);
        let result = refine(&request, &mut rng, Duration::ZERO);
        assert_eq!(result.num_trials, 1);
        assert!(result.per_direction[result.best_move.index()].is_some());
    }

    #[test]
    fn walks_head_towards_a_rich_target() {
        let mut world = fixtures::world(16, 16);
        fixtures::set_halite(&mut world, 6, 3, 800);
        let danger = danger_for(&world);
        let request = WalkRequest {
            grid: &world.grid,
            rules: &world.rules,
            danger: &danger,
            inspiration: false,
            start: world.grid.index(Position::new(3, 3)),
            destination: world.grid.index(Position::new(6, 3)),
            cargo: 0,
            mine_threshold: 10,
        };

        let mut rng = StdRng::seed_from_u64(11);
        let result = refine(&request, &mut rng, Duration::from_secs(10));
        assert_eq!(result.num_trials, 2700);
        assert_eq!(result.best_move, Direction::East);
        assert!(result.best_yield > 0.0);

        let costs = direction_costs(&result);
        assert_eq!(costs[Direction::East.index()], 0.0);
        assert!(costs[Direction::Still.index()] > 0.0);
        assert_eq!(costs[Direction::North.index()], UNSAMPLED_COST);
    }

    #[test]
    fn standing_on_target_mines_a_quarter() {
        let mut world = fixtures::world(16, 16);
        fixtures::set_halite(&mut world, 3, 3, 400);
        let danger = danger_for(&world);
        let cell = world.grid.index(Position::new(3, 3));
        let request = WalkRequest {
            grid: &world.grid,
            rules: &world.rules,
            danger: &danger,
            inspiration: false,
            start: cell,
            destination: cell,
            cargo: 0,
            mine_threshold: 10,
        };

        let mut rng = StdRng::seed_from_u64(1);
        let result = refine(&request, &mut rng, Duration::from_millis(10));
        assert_eq!(result.best_move, Direction::Still);
        assert_eq!(result.best_yield, 100.0);
    }

    #[test]
    fn regret_grows_as_yield_falls() {
        let result = WalkResult {
            best_move: Direction::East,
            best_yield: 100.0,
            per_direction: [Some(50.0), None, None, Some(100.0), Some(90.0)],
            num_trials: 3,
        };
        let costs = direction_costs(&result);
        assert_eq!(costs[Direction::East.index()], 0.0);
        assert!(costs[Direction::West.index()] < costs[Direction::Still.index()]);
        assert_eq!(costs[Direction::North.index()], UNSAMPLED_COST);
        assert!(costs[Direction::Still.index()] < UNSAMPLED_COST);
    }

    #[test]
    fn walks_are_reproducible_with_the_same_seed() {
        let mut world = fixtures::world(16, 16);
        for x in 0..16 {
            fixtures::set_halite(&mut world, x, 5, 100 + 37 * x);
        }
        let danger = danger_for(&world);
        let request = WalkRequest {
            grid: &world.grid,
            rules: &world.rules,
            danger: &danger,
            inspiration: false,
            start: world.grid.index(Position::new(1, 1)),
            destination: world.grid.index(Position::new(4, 5)),
            cargo: 0,
            mine_threshold: 10,
        };

        let first = refine(&request, &mut StdRng::seed_from_u64(3), Duration::from_secs(10));
        let second = refine(&request, &mut StdRng::seed_from_u64(3), Duration::from_secs(10));
        assert_eq!(first.best_move, second.best_move);
        assert_eq!(first.per_direction, second.per_direction);
    }

    #[test]
    fn poor_cells_on_the_way_are_not_mined() {
        let mut world = fixtures::world(16, 16);
        fixtures::set_halite(&mut world, 3, 3, 5);
        fixtures::set_halite(&mut world, 4, 3, 600);
        let danger = danger_for(&world);
        let mut request = WalkRequest {
            grid: &world.grid,
            rules: &world.rules,
            danger: &danger,
            inspiration: false,
            start: world.grid.index(Position::new(3, 3)),
            destination: world.grid.index(Position::new(4, 3)),
            cargo: 0,
            mine_threshold: 10,
        };

        let result = refine(&request, &mut StdRng::seed_from_u64(5), Duration::from_secs(10));
        assert_eq!(result.num_trials, 100);
        assert_eq!(result.best_move, Direction::East);
        assert_eq!(result.per_direction[Direction::Still.index()], None);

        // Worth stopping on once the threshold drops below it
        request.mine_threshold = 0;
        let result = refine(&request, &mut StdRng::seed_from_u64(5), Duration::from_secs(10));
        assert!(result.per_direction[Direction::Still.index()].is_some());
    }
}
