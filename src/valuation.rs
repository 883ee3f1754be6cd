use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use super::inputs::*;
use super::pathing::{CostField, RewardField};
use super::view::TurnContext;

/// Extraction rounds considered when valuing a target
const MINING_ROUNDS: i32 = 5;

/// Inspiration is only trusted this many turns ahead since enemies move
const INSPIRATION_HORIZON: i32 = 6;

/// Depth of the route richness tie-break
const RICHNESS_HORIZON: i32 = 8;

const MIN_CANDIDATES: usize = 4;
const MAX_CANDIDATES: usize = 32;

const CONTEST_MAX_CARGO: i32 = 700;
const CONTEST_MIN_PRIZE: i32 = 300;
const CONTEST_FRIEND_MARGIN: i32 = 2;

/// A friend further than this beyond the nearest other enemy cannot collect spilled cargo in time
const CONTEST_REACH: i32 = 2;

/// The cost fields generated once per turn: one per own unit, one per own structure
pub struct Fields {
    units: BTreeMap<UnitId, CostField>,
    structures: Vec<(usize, CostField)>,
}
impl Fields {
    pub fn generate(ctx: &TurnContext) -> Self {
        let grid = ctx.grid();
        let rules = ctx.rules();

        let units = ctx.me().units.iter().map(|unit| {
            let field = CostField::generate(ctx.cell_of(unit), grid, rules, |cell| ctx.enemy_at(cell).is_some());
            (unit.id, field)
        }).collect();

        let structures = ctx.own_structures.iter().map(|&cell| {
            (cell, CostField::generate(cell, grid, rules, |_| false))
        }).collect();

        Self { units, structures }
    }

    pub fn unit(&self, unit: UnitId) -> Option<&CostField> {
        self.units.get(&unit)
    }

    /// Field of the own structure closest to `cell`
    pub fn home(&self, ctx: &TurnContext, cell: usize) -> Option<&CostField> {
        let structure = ctx.closest_structure(cell)?;
        self.structures.iter().find(|(source, _)| *source == structure).map(|(_, field)| field)
    }
}

#[derive(Clone,Debug)]
pub struct Candidate {
    pub unit: UnitId,
    pub cell: usize,
    pub cost: f64,
    pub richness: f64,
    pub distance: i32,
}
impl Candidate {
    fn rank(&self, other: &Self) -> Ordering {
        self.cost.total_cmp(&other.cost)
            .then_with(|| other.richness.total_cmp(&self.richness))
            .then_with(|| self.distance.cmp(&other.distance))
    }
}
impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool { self.rank(other) == Ordering::Equal }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.rank(other)) }
}
impl Ord for Candidate {
    /// Worse candidates compare greater so a max-heap evicts them first
    fn cmp(&self, other: &Self) -> Ordering { self.rank(other) }
}

pub fn num_candidates(fleet_size: usize) -> usize {
    fleet_size.clamp(MIN_CANDIDATES, MAX_CANDIDATES)
}

/// Cost of sending `unit` to gather at `destination`. Lower is better, None means unusable.
pub fn score_cell(ctx: &TurnContext, fields: &Fields, unit: &Unit, destination: usize) -> Option<f64> {
    let grid = ctx.grid();
    let rules = ctx.rules();

    if ctx.structure_at(destination).is_some() { return None }

    let field = fields.unit(unit.id)?;
    if !field.is_reachable(destination) { return None }
    let home = fields.home(ctx, destination)?;
    if !home.is_reachable(destination) { return None }

    let turns_to = field.steps_to(destination);
    let burn_to = field.halite_burned(destination);
    let turns_back = home.steps_to(destination);
    let burn_home = home.halite_burned(destination);

    let mut bonus = 0;
    let mut density_allowed = true;
    if let Some(enemy) = ctx.enemy_at(destination) {
        if !should_contest(ctx, unit, destination) { return None }
        bonus = enemy.cargo;
        density_allowed = false;
    }

    let inspired =
        density_allowed
        && ctx.inspiration_enabled()
        && ctx.danger.is_inspired(destination)
        && turns_to <= INSPIRATION_HORIZON;
    let multiplier = if inspired { 1.0 + rules.inspired_bonus_multiplier } else { 1.0 };

    let headroom = (rules.capacity - unit.cargo).max(0) as f64;
    let mut remaining = grid.halite_at(destination);
    let mut mined = 0.0;
    let mut best = 0.0f64;
    for round in 1..=MINING_ROUNDS {
        let take = extraction(remaining, rules);
        remaining -= take;
        mined = (mined + take as f64 * multiplier).min(headroom);

        let net = (mined + bonus as f64 - burn_to as f64 - burn_home as f64).max(0.0);
        let rate = net / (turns_to + turns_back + round) as f64;
        best = best.max(rate);
    }

    Some(-best)
}

/// Whether `unit` should deliberately move onto the enemy unit occupying `cell`
pub fn should_contest(ctx: &TurnContext, unit: &Unit, cell: usize) -> bool {
    let enemy = match ctx.enemy_at(cell) {
        Some(enemy) => enemy,
        None => return false,
    };

    if unit.cargo > CONTEST_MAX_CARGO { return false }

    let prize = ctx.grid().halite_at(cell) + enemy.cargo;
    if prize < CONTEST_MIN_PRIZE { return false }

    let enemy_distance = nearest_distance(ctx, cell,
        ctx.world.enemies()
        .flat_map(|player| player.units.iter())
        .filter(|other| other.id != enemy.unit));
    let friend_distance = nearest_distance(ctx, cell, ctx.me().units.iter().filter(|other| other.id != unit.id));
    let (friend_distance, enemy_distance) = match (friend_distance, enemy_distance) {
        (_, None) => return true,
        (None, Some(_)) => return false,
        (Some(friend), Some(enemy)) => (friend, enemy),
    };

    let friends = ctx.danger.friends_near(cell);
    let enemies = ctx.danger.enemies_near(cell);
    if friends >= enemies + CONTEST_FRIEND_MARGIN { return true }

    if friend_distance > CONTEST_REACH + enemy_distance { return false }

    unit.cargo <= prize && friends >= enemies
}

fn nearest_distance<'a>(ctx: &TurnContext, cell: usize, units: impl Iterator<Item=&'a Unit>) -> Option<i32> {
    units.map(|unit| ctx.grid().cell_distance(ctx.cell_of(unit), cell)).min()
}

/// The best few target cells for each gathering unit, best first
pub fn select_candidates(ctx: &TurnContext, fields: &Fields, gatherers: &[&Unit]) -> BTreeMap<UnitId, Vec<Candidate>> {
    let grid = ctx.grid();
    let limit = num_candidates(ctx.fleet_size());

    let mut selected = BTreeMap::new();
    for &unit in gatherers.iter() {
        let source = ctx.cell_of(unit);
        let richness = RewardField::generate(source, grid, RICHNESS_HORIZON);

        let mut heap = BinaryHeap::with_capacity(limit + 1);
        for cell in 0..grid.num_cells() {
            if ctx.enemy_at(cell).is_none() && !ctx.should_mine(cell) { continue }

            let cost = match score_cell(ctx, fields, unit, cell) {
                Some(cost) => cost,
                None => continue,
            };

            heap.push(Candidate {
                unit: unit.id,
                cell,
                cost,
                richness: richness.richness(cell),
                distance: grid.cell_distance(source, cell),
            });
            if heap.len() > limit {
                heap.pop();
            }
        }

        let mut candidates = heap.into_sorted_vec();
        if candidates.is_empty() {
            tracing::debug!(unit = unit.id, "no usable targets, holding position");
            candidates.push(Candidate { unit: unit.id, cell: source, cost: 0.0, richness: 0.0, distance: 0 });
        }
        selected.insert(unit.id, candidates);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::inputs::fixtures;

    fn unit_of(world: &WorldState, id: UnitId) -> Unit {
        world.players.iter().flat_map(|p| p.units.iter()).find(|u| u.id == id).unwrap().clone()
    }

    #[test]
    fn richer_cells_cost_less() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 3, 3, 0);
        fixtures::set_halite(&mut world, 3, 5, 400);
        fixtures::set_halite(&mut world, 5, 3, 100);
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        let fields = Fields::generate(&ctx);
        let unit = unit_of(&world, 1);

        let rich = score_cell(&ctx, &fields, &unit, world.grid.index(Position::new(3, 5))).unwrap();
        let poor = score_cell(&ctx, &fields, &unit, world.grid.index(Position::new(5, 3))).unwrap();
        assert!(rich < poor);
    }

    #[test]
    fn structures_are_never_targets() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 1, 0, 0);
        fixtures::set_halite(&mut world, 0, 0, 500);
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        let fields = Fields::generate(&ctx);

        assert_eq!(score_cell(&ctx, &fields, &unit_of(&world, 1), world.grid.index(Position::new(0, 0))), None);
    }

    #[test]
    fn inspiration_raises_value_unless_disabled() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 3, 3, 0);
        fixtures::add_unit(&mut world, 1, 7, 4, 5, 0);
        fixtures::add_unit(&mut world, 1, 8, 2, 5, 0);
        fixtures::set_halite(&mut world, 3, 5, 400);
        let target = world.grid.index(Position::new(3, 5));
        let unit = unit_of(&world, 1);

        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        let inspired = score_cell(&ctx, &fields_for(&ctx), &unit, target).unwrap();

        let plain_config = Config { inspiration: false, ..Config::default() };
        let plain_ctx = TurnContext::new(&world, &plain_config);
        let plain = score_cell(&plain_ctx, &fields_for(&plain_ctx), &unit, target).unwrap();

        assert!(inspired < plain);
    }

    fn fields_for(ctx: &TurnContext) -> Fields {
        Fields::generate(ctx)
    }

    #[test]
    fn heavy_units_do_not_contest() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 3, 3, 800);
        fixtures::add_unit(&mut world, 0, 2, 4, 4, 0);
        fixtures::add_unit(&mut world, 1, 7, 3, 4, 500);
        let enemy_cell = world.grid.index(Position::new(3, 4));
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        let fields = Fields::generate(&ctx);

        assert!(!should_contest(&ctx, &unit_of(&world, 1), enemy_cell));
        assert_eq!(score_cell(&ctx, &fields, &unit_of(&world, 1), enemy_cell), None);

        // Light unit and no other enemy to pick up the spill
        assert!(should_contest(&ctx, &unit_of(&world, 2), enemy_cell));
        assert!(score_cell(&ctx, &fields, &unit_of(&world, 2), enemy_cell).unwrap() < 0.0);
    }

    #[test]
    fn small_prizes_are_not_contested() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 3, 3, 0);
        fixtures::add_unit(&mut world, 1, 7, 3, 4, 100);
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        assert!(!should_contest(&ctx, &unit_of(&world, 1), world.grid.index(Position::new(3, 4))));
    }

    /// Enemy with 400 cargo on (3,4), a second enemy one step from it, our unit on (3,3)
    fn contest_world(cargo: i32, friend: Position) -> WorldState {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 3, 3, cargo);
        fixtures::add_unit(&mut world, 0, 2, friend.x, friend.y, 0);
        fixtures::add_unit(&mut world, 1, 7, 3, 4, 400);
        fixtures::add_unit(&mut world, 1, 8, 4, 4, 0);
        world
    }

    #[test]
    fn even_numbers_contest_when_a_friend_is_close() {
        let world = contest_world(0, Position::new(2, 4));
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        let cell = world.grid.index(Position::new(3, 4));

        assert_eq!(ctx.danger.friends_near(cell), ctx.danger.enemies_near(cell));
        assert!(should_contest(&ctx, &unit_of(&world, 1), cell));
    }

    #[test]
    fn cargo_above_the_prize_is_not_risked() {
        let world = contest_world(600, Position::new(2, 4));
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        assert!(!should_contest(&ctx, &unit_of(&world, 1), world.grid.index(Position::new(3, 4))));
    }

    #[test]
    fn distant_friends_cannot_collect_the_spill() {
        // Friend four steps away against an enemy one step away
        let world = contest_world(0, Position::new(3, 8));
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        let cell = world.grid.index(Position::new(3, 4));

        assert!(ctx.danger.friends_near(cell) >= ctx.danger.enemies_near(cell));
        assert!(!should_contest(&ctx, &unit_of(&world, 1), cell));
    }

    #[test]
    fn poor_cells_are_not_candidates() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 3, 3, 0);
        for x in 0..16 {
            for y in 0..16 {
                fixtures::set_halite(&mut world, x, y, 40);
            }
        }
        fixtures::set_halite(&mut world, 5, 5, 300);
        fixtures::set_halite(&mut world, 1, 6, 200);
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        let fields = Fields::generate(&ctx);
        let unit = unit_of(&world, 1);

        assert_eq!(ctx.mine_threshold, 40);
        let selected = select_candidates(&ctx, &fields, &[&unit]);
        let cells: Vec<usize> = selected[&1].iter().map(|candidate| candidate.cell).collect();
        assert_eq!(cells.len(), 2);
        assert!(cells.contains(&world.grid.index(Position::new(5, 5))));
        assert!(cells.contains(&world.grid.index(Position::new(1, 6))));
    }

    #[test]
    fn candidates_are_bounded_and_sorted() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 3, 3, 0);
        for x in 0..16 {
            fixtures::set_halite(&mut world, x, 6, 50 + 20 * x);
        }
        let config = Config::default();
        let ctx = TurnContext::new(&world, &config);
        let fields = Fields::generate(&ctx);
        let unit = unit_of(&world, 1);

        let selected = select_candidates(&ctx, &fields, &[&unit]);
        let candidates = &selected[&1];
        assert_eq!(candidates.len(), num_candidates(1));
        assert!(candidates.windows(2).all(|pair| pair[0].cost <= pair[1].cost));
        assert!(candidates[0].cost < 0.0);
    }

    #[test]
    fn candidate_count_is_clamped() {
        assert_eq!(num_candidates(1), 4);
        assert_eq!(num_candidates(20), 20);
        assert_eq!(num_candidates(100), 32);
    }
}
