use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use super::inputs::*;
use super::pathing::{self, CostField};
use super::roles::Role;
use super::solving::{self, CostMatrix};
use super::valuation::Candidate;

/// Regret ranks for units that follow a path rather than a walk
pub const RANK_PATH: f64 = 0.0;
pub const RANK_CLOSER: f64 = 100.0;
pub const RANK_STILL: f64 = 1000.0;
pub const RANK_OTHER: f64 = 10000.0;

pub type DirectionCosts = [f64; 5];

/// Dense numbering of the cells that appear in any candidate list
pub struct CandidateIndex {
    /// cell to id
    id_lookup: BTreeMap<usize, usize>,

    /// id to cell
    cell_lookup: Vec<usize>,
}
impl CandidateIndex {
    pub fn new<'a>(candidates: impl Iterator<Item=&'a Candidate>) -> Self {
        let mut id_lookup = BTreeMap::new();
        let mut cell_lookup = Vec::new();
        for candidate in candidates {
            if !id_lookup.contains_key(&candidate.cell) {
                id_lookup.insert(candidate.cell, cell_lookup.len());
                cell_lookup.push(candidate.cell);
            }
        }
        Self { id_lookup, cell_lookup }
    }

    pub fn len(&self) -> usize { self.cell_lookup.len() }

    pub fn id(&self, cell: usize) -> Option<usize> { self.id_lookup.get(&cell).copied() }

    pub fn cell(&self, id: usize) -> usize { self.cell_lookup[id] }
}

/// Gives each gathering unit a distinct target cell from its candidates.
/// Units left out by the matching take their best candidate nobody else holds;
/// units with none left get no target and hold position.
pub fn assign_targets(candidates: &BTreeMap<UnitId, Vec<Candidate>>) -> BTreeMap<UnitId, usize> {
    let units: Vec<UnitId> = candidates.keys().copied().collect();
    let index = CandidateIndex::new(candidates.values().flat_map(|list| list.iter()));

    let mut matrix = CostMatrix::new(units.len(), index.len());
    for (row, unit) in units.iter().enumerate() {
        for candidate in candidates[unit].iter() {
            if let Some(column) = index.id(candidate.cell) {
                matrix.set(row, column, candidate.cost);
            }
        }
    }

    let matching = solving::solve(&matrix);
    tracing::debug!(units = units.len(), cells = index.len(), total = matching.total_cost, "targets assigned");

    let mut targets = BTreeMap::new();
    let mut taken = BTreeSet::new();
    for (row, &unit) in units.iter().enumerate() {
        if let Some(column) = matching.assignments[row] {
            let cell = index.cell(column);
            taken.insert(cell);
            targets.insert(unit, cell);
        }
    }

    for (row, &unit) in units.iter().enumerate() {
        if matching.assignments[row].is_some() { continue }
        match candidates[&unit].iter().find(|candidate| !taken.contains(&candidate.cell)) {
            Some(free) => {
                taken.insert(free.cell);
                targets.insert(unit, free.cell);
            },
            None => tracing::debug!(unit, "every candidate taken, holding position"),
        }
    }
    targets
}

/// One unit's movement request for the move matching
#[derive(Clone,Debug)]
pub struct Order {
    pub unit: UnitId,
    pub cell: usize,
    pub destination: usize,
    pub role: Role,

    /// Indexed by Direction::index; infinite means banned
    pub costs: DirectionCosts,

    pub priority: f64,

    /// May share an own structure cell with other units
    pub may_stack: bool,
}
impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}->{}", self.unit, self.role, self.destination)
    }
}

pub fn priority_of(role: Role) -> f64 {
    match role {
        Role::EmergencyReturn => 4.0,
        Role::Returning | Role::BuildingDropoff => 3.0,
        Role::Gathering => 1.0,
    }
}

/// Ranks each direction by how well it follows the cheapest path to `destination`
pub fn rank_costs(field: &CostField, grid: &Grid, destination: usize) -> DirectionCosts {
    let cell = field.source();
    let preferred = pathing::first_move(field, grid, destination);
    let current_distance = grid.cell_distance(cell, destination);

    let mut costs = [RANK_OTHER; 5];
    for direction in Direction::ALL {
        let next = grid.neighbor(cell, direction);
        costs[direction.index()] =
            if direction == preferred { RANK_PATH }
            else if direction == Direction::Still { RANK_STILL }
            else if grid.cell_distance(next, destination) < current_distance { RANK_CLOSER }
            else { RANK_OTHER };
    }
    costs
}

/// Only staying put is possible
pub fn frozen_costs() -> DirectionCosts {
    let mut costs = [f64::INFINITY; 5];
    costs[Direction::Still.index()] = 0.0;
    costs
}
