use super::config::Config;
use super::danger::{DangerMap, Occupant};
use super::inputs::*;
use super::pathing::{NearestMap, UNREACHABLE};

/// Bounds on the median halite below which a cell is not worth mining
const MIN_MINE_THRESHOLD: i32 = 10;
const MAX_MINE_THRESHOLD: i32 = 99;

#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub struct StructureSlot {
    pub owner: PlayerId,
    pub kind: StructureKind,
    pub provisional: bool,
}

/// A WorldState plus the per-turn lookups derived from it.
/// Everything here is rebuilt at the start of a turn and dropped at its end.
pub struct TurnContext<'a> {
    pub world: &'a WorldState,
    pub config: &'a Config,

    /// cell -> unit standing on it
    pub occupants: Box<[Option<Occupant>]>,

    /// cell -> structure built on it
    pub structures: Box<[Option<StructureSlot>]>,

    pub own_structures: Vec<usize>,
    pub enemy_structures: Vec<usize>,

    /// cell -> closest own structure
    nearest_structure: NearestMap,
    nearest_enemy_structure: NearestMap,

    pub danger: DangerMap,

    /// Cells holding no more halite than this are not worth stopping on
    pub mine_threshold: i32,
}
impl<'a> TurnContext<'a> {
    pub fn new(world: &'a WorldState, config: &'a Config) -> Self {
        let grid = &world.grid;
        let num_cells = grid.num_cells();

        let mut occupants = vec![None; num_cells];
        let mut structures = vec![None; num_cells];
        let mut own_structures = Vec::new();
        let mut enemy_structures = Vec::new();
        for player in world.players.iter() {
            for unit in player.units.iter() {
                occupants[grid.index(unit.position)] = Some(Occupant {
                    owner: player.id,
                    unit: unit.id,
                    cargo: unit.cargo,
                });
            }
            for structure in player.structures.iter() {
                let cell = grid.index(structure.position);
                structures[cell] = Some(StructureSlot {
                    owner: player.id,
                    kind: structure.kind,
                    provisional: structure.provisional,
                });
                if player.id == world.me {
                    own_structures.push(cell);
                } else {
                    enemy_structures.push(cell);
                }
            }
        }

        let inspiration_enabled = config.inspiration && world.rules.inspiration_enabled;
        let danger = DangerMap::generate(world, &occupants, inspiration_enabled);

        Self {
            mine_threshold: mine_threshold(grid),
            nearest_structure: NearestMap::generate(grid, &own_structures),
            nearest_enemy_structure: NearestMap::generate(grid, &enemy_structures),
            occupants: occupants.into_boxed_slice(),
            structures: structures.into_boxed_slice(),
            own_structures,
            enemy_structures,
            danger,
            world,
            config,
        }
    }

    pub fn grid(&self) -> &'a Grid { &self.world.grid }

    pub fn rules(&self) -> &'a Rules { &self.world.rules }

    pub fn me(&self) -> &'a Player { self.world.my_player() }

    pub fn fleet_size(&self) -> usize { self.me().units.len() }

    pub fn num_players(&self) -> usize { self.world.players.len() }

    pub fn inspiration_enabled(&self) -> bool {
        self.config.inspiration && self.world.rules.inspiration_enabled
    }

    pub fn should_mine(&self, cell: usize) -> bool {
        self.grid().halite_at(cell) > self.mine_threshold
    }

    pub fn cell_of(&self, unit: &Unit) -> usize {
        self.world.grid.index(unit.position)
    }

    pub fn enemy_at(&self, cell: usize) -> Option<Occupant> {
        self.occupants[cell].filter(|o| o.owner != self.world.me)
    }

    pub fn structure_at(&self, cell: usize) -> Option<StructureSlot> {
        self.structures[cell]
    }

    pub fn is_own_structure(&self, cell: usize) -> bool {
        self.structures[cell].map_or(false, |s| s.owner == self.world.me)
    }

    pub fn closest_structure(&self, cell: usize) -> Option<usize> {
        self.nearest_structure.nearest(cell).map(|label| self.own_structures[label])
    }

    pub fn distance_to_structure(&self, cell: usize) -> i32 {
        self.nearest_structure.distance_to(cell)
    }

    pub fn distance_to_enemy_structure(&self, cell: usize) -> i32 {
        if self.enemy_structures.is_empty() { return UNREACHABLE }
        self.nearest_enemy_structure.distance_to(cell)
    }

    /// Registers a drop structure converted this turn so returns and valuations use it immediately
    pub fn add_provisional_structure(&mut self, cell: usize) {
        if self.structures[cell].is_some() { return }
        self.structures[cell] = Some(StructureSlot {
            owner: self.world.me,
            kind: StructureKind::Dropoff,
            provisional: true,
        });
        self.own_structures.push(cell);
        self.nearest_structure = NearestMap::generate(self.grid(), &self.own_structures);
    }
}

/// Median cell halite, clamped
pub fn mine_threshold(grid: &Grid) -> i32 {
    let mut halite = grid.halite.to_vec();
    if halite.is_empty() { return MIN_MINE_THRESHOLD }
    let middle = halite.len() / 2;
    let (_, median, _) = halite.select_nth_unstable(middle);
    (*median).clamp(MIN_MINE_THRESHOLD, MAX_MINE_THRESHOLD)
}
