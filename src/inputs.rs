use std::fmt::Display;
use serde::Deserialize;

pub type PlayerId = usize;
pub type UnitId = u32;
pub type StructureId = u32;

#[derive(Copy,Clone,Debug,PartialEq,Eq,Hash,PartialOrd,Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}
impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}
impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Copy,Clone,Debug,PartialEq,Eq,Hash)]
pub enum Direction {
    Still,
    North,
    South,
    East,
    West,
}
impl Direction {
    pub const ALL: [Direction; 5] = [Direction::Still, Direction::North, Direction::South, Direction::East, Direction::West];
    pub const CARDINALS: [Direction; 4] = [Direction::North, Direction::South, Direction::East, Direction::West];

    pub fn index(self) -> usize {
        match self {
            Direction::Still => 0,
            Direction::North => 1,
            Direction::South => 2,
            Direction::East => 3,
            Direction::West => 4,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Still => (0, 0),
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }
}
impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Still => write!(f, "o"),
            Direction::North => write!(f, "n"),
            Direction::South => write!(f, "s"),
            Direction::East => write!(f, "e"),
            Direction::West => write!(f, "w"),
        }
    }
}

/// Game constants as sent by the host. Missing keys fall back to the standard values.
#[derive(Clone,Debug,PartialEq,Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Rules {
    #[serde(rename = "MAX_ENERGY")]
    pub capacity: i32,
    #[serde(rename = "NEW_ENTITY_ENERGY_COST")]
    pub unit_cost: i32,
    pub dropoff_cost: i32,
    pub move_cost_ratio: i32,
    pub extract_ratio: i32,
    pub inspiration_enabled: bool,
    pub inspiration_radius: i32,
    pub inspiration_ship_count: i32,
    pub inspired_bonus_multiplier: f64,
    pub max_turns: u32,
}
impl Default for Rules {
    fn default() -> Self {
        Self {
            capacity: 1000,
            unit_cost: 1000,
            dropoff_cost: 4000,
            move_cost_ratio: 10,
            extract_ratio: 4,
            inspiration_enabled: true,
            inspiration_radius: 4,
            inspiration_ship_count: 2,
            inspired_bonus_multiplier: 2.0,
            max_turns: 400,
        }
    }
}

#[derive(Clone,Debug)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    pub halite: Box<[i32]>,
}
impl Grid {
    pub fn new(width: i32, height: i32, halite: Vec<i32>) -> Self {
        assert_eq!(halite.len(), (width * height) as usize, "grid dimensions do not match cell count");
        Self {
            width,
            height,
            halite: halite.into_boxed_slice(),
        }
    }

    pub fn empty(width: i32, height: i32) -> Self {
        Self::new(width, height, vec![0; (width * height) as usize])
    }

    pub fn num_cells(&self) -> usize { self.halite.len() }

    pub fn normalize(&self, position: Position) -> Position {
        Position::new(position.x.rem_euclid(self.width), position.y.rem_euclid(self.height))
    }

    pub fn index(&self, position: Position) -> usize {
        let p = self.normalize(position);
        (p.y * self.width + p.x) as usize
    }

    pub fn position(&self, index: usize) -> Position {
        let index = index as i32;
        Position::new(index % self.width, index / self.width)
    }

    pub fn neighbor(&self, cell: usize, direction: Direction) -> usize {
        self.index(self.position(cell).offset(direction))
    }

    pub fn neighbors(&self, cell: usize) -> [usize; 4] {
        Direction::CARDINALS.map(|d| self.neighbor(cell, d))
    }

    /// Toroidal Manhattan distance
    pub fn distance(&self, a: Position, b: Position) -> i32 {
        let a = self.normalize(a);
        let b = self.normalize(b);
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        dx.min(self.width - dx) + dy.min(self.height - dy)
    }

    pub fn cell_distance(&self, a: usize, b: usize) -> i32 {
        self.distance(self.position(a), self.position(b))
    }

    pub fn direction_between(&self, from: usize, to: usize) -> Option<Direction> {
        Direction::ALL.iter().copied().find(|&d| self.neighbor(from, d) == to)
    }

    pub fn halite_at(&self, cell: usize) -> i32 { self.halite[cell] }

    pub fn move_cost(&self, cell: usize, rules: &Rules) -> i32 {
        self.halite[cell] / rules.move_cost_ratio
    }

    pub fn total_halite(&self) -> i64 {
        self.halite.iter().map(|&h| h as i64).sum()
    }
}

/// Halite extracted by one round of mining a cell holding `halite`
pub fn extraction(halite: i32, rules: &Rules) -> i32 {
    if halite <= 0 { return 0 }
    (halite + rules.extract_ratio - 1) / rules.extract_ratio
}

#[derive(Clone,Debug)]
pub struct Unit {
    pub owner: PlayerId,
    pub id: UnitId,
    pub position: Position,
    pub cargo: i32,
}

#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub enum StructureKind {
    Shipyard,
    Dropoff,
}

#[derive(Clone,Debug)]
pub struct Structure {
    pub owner: PlayerId,
    pub id: StructureId,
    pub position: Position,
    pub kind: StructureKind,

    /// Converted this turn and not yet reported by the host
    pub provisional: bool,
}

#[derive(Clone,Debug)]
pub struct Player {
    pub id: PlayerId,
    pub halite: i32,
    pub units: Vec<Unit>,
    pub structures: Vec<Structure>,
}
impl Player {
    pub fn shipyard(&self) -> Option<&Structure> {
        self.structures.iter().find(|s| s.kind == StructureKind::Shipyard)
    }
}

#[derive(Clone,Debug)]
pub struct WorldState {
    pub turn: u32,
    pub me: PlayerId,
    pub rules: Rules,
    pub grid: Grid,
    pub players: Vec<Player>,
}
impl WorldState {
    pub fn remaining_turns(&self) -> i32 {
        self.rules.max_turns as i32 - self.turn as i32
    }

    pub fn my_player(&self) -> &Player {
        self.players.iter().find(|p| p.id == self.me).expect("my player missing from world state")
    }

    pub fn enemies(&self) -> impl Iterator<Item=&Player> + '_ {
        self.players.iter().filter(move |p| p.id != self.me)
    }
}

#[derive(Clone,Debug,PartialEq,Eq)]
pub enum Action {
    Move { unit: UnitId, direction: Direction },
    Convert { unit: UnitId },
    Spawn,
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn world(width: i32, height: i32) -> WorldState {
        WorldState {
            turn: 0,
            me: 0,
            rules: Rules::default(),
            grid: Grid::empty(width, height),
            players: vec![player(0, Position::new(0, 0)), player(1, Position::new(width / 2, height / 2))],
        }
    }

    pub fn player(id: PlayerId, shipyard: Position) -> Player {
        Player {
            id,
            halite: 0,
            units: Vec::new(),
            structures: vec![Structure {
                owner: id,
                id: 1000 + id as StructureId,
                position: shipyard,
                kind: StructureKind::Shipyard,
                provisional: false,
            }],
        }
    }

    pub fn add_unit(world: &mut WorldState, owner: PlayerId, id: UnitId, x: i32, y: i32, cargo: i32) {
        let player = world.players.iter_mut().find(|p| p.id == owner).expect("no such player");
        player.units.push(Unit { owner, id, position: Position::new(x, y), cargo });
    }

    pub fn set_halite(world: &mut WorldState, x: i32, y: i32, halite: i32) {
        let index = world.grid.index(Position::new(x, y));
        world.grid.halite[index] = halite;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        let grid = Grid::empty(7, 5);
        for x in -20..20 {
            for y in -20..20 {
                let once = grid.normalize(Position::new(x, y));
                assert_eq!(grid.normalize(once), once);
                assert!(once.x >= 0 && once.x < 7 && once.y >= 0 && once.y < 5);
            }
        }
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let grid = Grid::empty(8, 6);
        for a in 0..grid.num_cells() {
            let p = grid.position(a);
            assert_eq!(grid.distance(p, p), 0);
            for b in 0..grid.num_cells() {
                let q = grid.position(b);
                assert_eq!(grid.distance(p, q), grid.distance(q, p));
            }
        }
    }

    #[test]
    fn distance_wraps_around() {
        let grid = Grid::empty(8, 8);
        assert_eq!(grid.distance(Position::new(0, 0), Position::new(7, 7)), 2);
        assert_eq!(grid.distance(Position::new(0, 0), Position::new(4, 4)), 8);
    }

    #[test]
    fn neighbors_wrap() {
        let grid = Grid::empty(4, 4);
        let corner = grid.index(Position::new(0, 0));
        assert_eq!(grid.position(grid.neighbor(corner, Direction::North)), Position::new(0, 3));
        assert_eq!(grid.position(grid.neighbor(corner, Direction::West)), Position::new(3, 0));
        assert_eq!(grid.direction_between(corner, grid.neighbor(corner, Direction::East)), Some(Direction::East));
    }

    #[test]
    fn rules_fill_missing_constants_with_defaults() {
        let rules: Rules = serde_json::from_str(r#"{"MAX_TURNS": 425, "MAX_ENERGY": 1000, "game_seed": 7}"#).unwrap();
        assert_eq!(rules.max_turns, 425);
        assert_eq!(rules.dropoff_cost, 4000);
        assert_eq!(rules.extract_ratio, 4);
    }

    #[test]
    fn extraction_rounds_up() {
        let rules = Rules::default();
        assert_eq!(extraction(0, &rules), 0);
        assert_eq!(extraction(1, &rules), 1);
        assert_eq!(extraction(100, &rules), 25);
        assert_eq!(extraction(101, &rules), 26);
    }
}
