use std::collections::BTreeMap;

use super::inputs::*;
use super::planning::Order;
use super::roles::Role;
use super::solving::{self, CostMatrix};
use super::view::TurnContext;

/// Cost of staying put when the policy bans it but other moves remain
pub const RELUCTANT_STILL_COST: f64 = 100_000.0;

#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub enum EngagementPolicy {
    /// Keep clear of any cell an enemy could reach next turn
    Avoid,
    /// Only refuse to step onto enemies
    Tolerate,
    /// Risk threatened cells when outnumbering and carrying little
    Smart,
    Ignore,
}

pub fn policy_for(role: Role, cargo: i32, rules: &Rules, num_players: usize) -> EngagementPolicy {
    match role {
        Role::Gathering => if num_players > 2 { EngagementPolicy::Tolerate } else { EngagementPolicy::Smart },
        Role::Returning => if cargo * 2 >= rules.capacity { EngagementPolicy::Avoid } else { EngagementPolicy::Tolerate },
        Role::BuildingDropoff => EngagementPolicy::Avoid,
        Role::EmergencyReturn => EngagementPolicy::Ignore,
    }
}

#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub struct DirectionSet([bool; 5]);
impl DirectionSet {
    pub fn none() -> Self { Self([false; 5]) }

    pub fn all() -> Self { Self([true; 5]) }

    pub fn only(direction: Direction) -> Self {
        let mut set = Self::none();
        set.insert(direction);
        set
    }

    pub fn insert(&mut self, direction: Direction) { self.0[direction.index()] = true; }

    pub fn contains(&self, direction: Direction) -> bool { self.0[direction.index()] }
}

/// Directions `unit` may take this turn under `policy`
pub fn allowed_offsets(unit: &Unit, policy: EngagementPolicy, stuck: bool, ctx: &TurnContext) -> DirectionSet {
    let grid = ctx.grid();
    let cell = ctx.cell_of(unit);

    if unit.cargo < grid.move_cost(cell, ctx.rules()) { return DirectionSet::only(Direction::Still) }
    if stuck || policy == EngagementPolicy::Ignore { return DirectionSet::all() }

    let outnumbered = ctx.danger.friends_near(cell) < ctx.danger.enemies_near(cell);

    let mut allowed = DirectionSet::none();
    for direction in Direction::ALL {
        let target = grid.neighbor(cell, direction);
        if ctx.is_own_structure(target) {
            allowed.insert(direction);
            continue;
        }

        let ok = match policy {
            EngagementPolicy::Avoid => !ctx.danger.is_threatened(target),
            EngagementPolicy::Tolerate => ctx.enemy_at(target).is_none(),
            EngagementPolicy::Smart => match ctx.danger.lightest_threat(target) {
                None => true,
                Some(lightest) => !outnumbered && unit.cargo <= lightest,
            },
            EngagementPolicy::Ignore => true,
        };
        if ok {
            allowed.insert(direction);
        }
    }
    allowed
}

/// Applies `allowed` to a cost vector: anything outside the set is banned
pub fn restrict(costs: &mut [f64; 5], allowed: DirectionSet) {
    for direction in Direction::ALL {
        if !allowed.contains(direction) {
            costs[direction.index()] = f64::INFINITY;
        }
    }
}

#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub struct Resolved {
    pub unit: UnitId,
    pub direction: Direction,
    pub destination: usize,
}

/// Matches every order to a distinct next cell. Only units allowed to stack may share
/// the cell of an own structure, each through a private column.
pub fn resolve_moves(orders: &[Order], ctx: &TurnContext) -> Vec<Resolved> {
    let grid = ctx.grid();

    let mut shared: BTreeMap<usize, usize> = BTreeMap::new();
    let mut num_columns = 0;
    let mut options: Vec<Vec<(usize, Direction, f64)>> = Vec::with_capacity(orders.len());
    for order in orders.iter() {
        let mut costs = order.costs;
        let still = Direction::Still.index();
        if costs.iter().all(|c| !c.is_finite()) {
            tracing::warn!(unit = order.unit, "every move banned, staying put");
            costs[still] = 0.0;
        } else if !costs[still].is_finite() {
            costs[still] = RELUCTANT_STILL_COST;
        }

        let mut row = Vec::with_capacity(Direction::ALL.len());
        for direction in Direction::ALL {
            let cost = costs[direction.index()];
            if !cost.is_finite() { continue }

            let target = grid.neighbor(order.cell, direction);
            let column =
                if order.may_stack && direction != Direction::Still && ctx.is_own_structure(target) {
                    num_columns += 1;
                    num_columns - 1
                } else {
                    *shared.entry(target).or_insert_with(|| {
                        num_columns += 1;
                        num_columns - 1
                    })
                };
            row.push((column, direction, cost * order.priority));
        }
        options.push(row);
    }

    let mut matrix = CostMatrix::new(orders.len(), num_columns);
    for (row, row_options) in options.iter().enumerate() {
        for &(column, _, cost) in row_options.iter() {
            matrix.set(row, column, cost);
        }
    }

    let matching = solving::solve(&matrix);

    orders.iter().enumerate().map(|(row, order)| {
        let direction = matching.assignments[row]
            .and_then(|column| options[row].iter().find(|(c, _, _)| *c == column))
            .map_or_else(|| {
                tracing::warn!(unit = order.unit, "no move matched, staying put");
                Direction::Still
            }, |&(_, direction, _)| direction);

        Resolved {
            unit: order.unit,
            direction,
            destination: grid.neighbor(order.cell, direction),
        }
    }).collect()
}
