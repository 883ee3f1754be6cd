use std::collections::{BTreeMap, VecDeque};
use std::fmt::Display;

use super::inputs::*;
use super::view::TurnContext;

/// Positions remembered per unit for stuck detection
pub const HISTORY_LENGTH: usize = 5;

/// Cargo fractions of capacity that send a gatherer home
const EARLY_RETURN_FRACTION: f64 = 0.90;
const LATE_RETURN_FRACTION: f64 = 0.95;

/// Units per extra turn of slack in the emergency margin
const EMERGENCY_CONGESTION_DIVISOR: usize = 8;

#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub enum Role {
    Gathering,
    Returning,
    EmergencyReturn,
    BuildingDropoff,
}
impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Gathering => write!(f, "gather"),
            Role::Returning => write!(f, "return"),
            Role::EmergencyReturn => write!(f, "emergency"),
            Role::BuildingDropoff => write!(f, "build"),
        }
    }
}

/// Everything a role transition looks at for one unit
#[derive(Clone,Debug)]
pub struct RoleInputs {
    pub cargo: i32,
    pub capacity: i32,
    pub distance_home: i32,
    pub remaining_turns: i32,
    pub fleet_size: usize,
    pub turn: u32,
    pub max_turns: u32,
}
impl RoleInputs {
    pub fn return_threshold(&self) -> i32 {
        let fraction = if self.turn < self.max_turns / 2 { EARLY_RETURN_FRACTION } else { LATE_RETURN_FRACTION };
        (self.capacity as f64 * fraction).round() as i32
    }

    pub fn must_head_home(&self) -> bool {
        let margin = (self.fleet_size / EMERGENCY_CONGESTION_DIVISOR) as i32;
        self.remaining_turns <= self.distance_home.saturating_add(margin)
    }
}

pub fn next_role(current: Role, inputs: &RoleInputs) -> Role {
    if current == Role::EmergencyReturn { return Role::EmergencyReturn }
    if inputs.must_head_home() { return Role::EmergencyReturn }

    match current {
        Role::Gathering if inputs.cargo >= inputs.return_threshold() => Role::Returning,
        Role::Returning if inputs.cargo <= 0 => Role::Gathering,
        other => other,
    }
}

#[derive(Clone,Debug)]
pub struct UnitMemory {
    pub role: Role,
    pub history: VecDeque<Position>,
}
impl UnitMemory {
    fn new() -> Self {
        Self {
            role: Role::Gathering,
            history: VecDeque::with_capacity(HISTORY_LENGTH),
        }
    }
}

/// The only state carried from one turn to the next
#[derive(Clone,Debug,Default)]
pub struct RoleBook {
    units: BTreeMap<UnitId, UnitMemory>,
}
impl RoleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets vanished units, starts new ones as gatherers and records this turn's positions
    pub fn begin_turn(&mut self, world: &WorldState) {
        let me = world.my_player();
        self.units.retain(|id, _| me.units.iter().any(|unit| unit.id == *id));

        for unit in me.units.iter() {
            if !self.units.contains_key(&unit.id) {
                self.units.insert(unit.id, UnitMemory::new());
            }

            if let Some(memory) = self.units.get_mut(&unit.id) {
                if memory.history.len() >= HISTORY_LENGTH {
                    memory.history.pop_front();
                }
                memory.history.push_back(unit.position);
            }
        }
    }

    pub fn update(&mut self, ctx: &TurnContext) {
        let world = ctx.world;
        for unit in ctx.me().units.iter() {
            let inputs = RoleInputs {
                cargo: unit.cargo,
                capacity: world.rules.capacity,
                distance_home: ctx.distance_to_structure(ctx.cell_of(unit)),
                remaining_turns: world.remaining_turns(),
                fleet_size: ctx.fleet_size(),
                turn: world.turn,
                max_turns: world.rules.max_turns,
            };

            if let Some(memory) = self.units.get_mut(&unit.id) {
                let role = next_role(memory.role, &inputs);
                if role != memory.role {
                    tracing::debug!(unit = unit.id, from = %memory.role, to = %role, cargo = unit.cargo, "role change");
                }
                memory.role = role;
            }
        }
    }

    pub fn role(&self, unit: UnitId) -> Role {
        self.units.get(&unit).map_or(Role::Gathering, |memory| memory.role)
    }

    pub fn set_role(&mut self, unit: UnitId, role: Role) {
        if let Some(memory) = self.units.get_mut(&unit) {
            memory.role = role;
        }
    }

    /// Sends every builder except `keep` back to gathering
    pub fn release_builders(&mut self, keep: Option<UnitId>) {
        for (id, memory) in self.units.iter_mut() {
            if memory.role == Role::BuildingDropoff && Some(*id) != keep {
                memory.role = Role::Gathering;
            }
        }
    }

    pub fn is_stuck(&self, unit: UnitId) -> bool {
        match self.units.get(&unit) {
            Some(memory) => {
                memory.history.len() >= HISTORY_LENGTH
                && memory.history.iter().all(|&p| p == memory.history[0])
            },
            None => false,
        }
    }

    pub fn count(&self, role: Role) -> usize {
        self.units.values().filter(|memory| memory.role == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::inputs::fixtures;

    fn inputs(cargo: i32) -> RoleInputs {
        RoleInputs {
            cargo,
            capacity: 1000,
            distance_home: 10,
            remaining_turns: 300,
            fleet_size: 1,
            turn: 100,
            max_turns: 400,
        }
    }

    #[test]
    fn gatherer_returns_at_threshold_and_resumes_when_empty() {
        assert_eq!(next_role(Role::Gathering, &inputs(899)), Role::Gathering);
        assert_eq!(next_role(Role::Gathering, &inputs(900)), Role::Returning);
        assert_eq!(next_role(Role::Returning, &inputs(1)), Role::Returning);
        assert_eq!(next_role(Role::Returning, &inputs(0)), Role::Gathering);
    }

    #[test]
    fn threshold_rises_late_in_the_game() {
        let late = RoleInputs { turn: 250, ..inputs(930) };
        assert_eq!(next_role(Role::Gathering, &late), Role::Gathering);
        let full = RoleInputs { turn: 250, ..inputs(950) };
        assert_eq!(next_role(Role::Gathering, &full), Role::Returning);
    }

    #[test]
    fn emergency_return_when_out_of_turns() {
        let exact = RoleInputs { remaining_turns: 10, ..inputs(0) };
        assert_eq!(next_role(Role::Gathering, &exact), Role::EmergencyReturn);

        let spare = RoleInputs { remaining_turns: 11, ..inputs(0) };
        assert_eq!(next_role(Role::Gathering, &spare), Role::Gathering);

        // Terminal even if the clock looks fine again
        assert_eq!(next_role(Role::EmergencyReturn, &spare), Role::EmergencyReturn);
    }

    #[test]
    fn large_fleets_head_home_earlier() {
        let crowded = RoleInputs { remaining_turns: 12, fleet_size: 16, ..inputs(0) };
        assert_eq!(next_role(Role::Returning, &crowded), Role::EmergencyReturn);
    }

    #[test]
    fn book_initialises_new_units_and_detects_stuck_ones() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 3, 4, 4, 0);
        let config = Config::default();

        let mut book = RoleBook::new();
        for _ in 0..HISTORY_LENGTH {
            book.begin_turn(&world);
            let ctx = TurnContext::new(&world, &config);
            book.update(&ctx);
        }
        assert_eq!(book.role(3), Role::Gathering);
        assert!(book.is_stuck(3));

        world.players[0].units[0].position = Position::new(5, 4);
        book.begin_turn(&world);
        assert!(!book.is_stuck(3));

        world.players[0].units.clear();
        book.begin_turn(&world);
        assert_eq!(book.count(Role::Gathering), 0);
    }

    #[test]
    fn builders_are_released_unless_kept() {
        let mut world = fixtures::world(16, 16);
        fixtures::add_unit(&mut world, 0, 1, 4, 4, 0);
        fixtures::add_unit(&mut world, 0, 2, 5, 4, 0);
        let mut book = RoleBook::new();
        book.begin_turn(&world);
        book.set_role(1, Role::BuildingDropoff);
        book.set_role(2, Role::BuildingDropoff);

        book.release_builders(Some(2));
        assert_eq!(book.role(1), Role::Gathering);
        assert_eq!(book.role(2), Role::BuildingDropoff);
    }
}
