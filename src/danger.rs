use super::inputs::*;

pub const DENSITY_RADIUS: i32 = 5;

/// A unit seen by the danger map: owner and cargo at a cell
#[derive(Copy,Clone,Debug,PartialEq,Eq)]
pub struct Occupant {
    pub owner: PlayerId,
    pub unit: UnitId,
    pub cargo: i32,
}

/// Per-cell threat and density derived once per turn.
pub struct DangerMap {
    /// Lightest enemy cargo among enemies on or adjacent to the cell
    lightest_threat: Box<[Option<i32>]>,

    /// Units within the inspiration radius
    enemies_near: Box<[i32]>,
    friends_near: Box<[i32]>,

    inspired: Box<[bool]>,

    /// Halite summed within DENSITY_RADIUS
    density: Box<[i64]>,
}
impl DangerMap {
    pub fn generate(world: &WorldState, occupants: &[Option<Occupant>], inspiration_enabled: bool) -> Self {
        let grid = &world.grid;
        let rules = &world.rules;
        let num_cells = grid.num_cells();

        let mut lightest_threat: Vec<Option<i32>> = vec![None; num_cells];
        let mut enemies_near = vec![0; num_cells];
        let mut friends_near = vec![0; num_cells];

        for (cell, occupant) in occupants.iter().enumerate() {
            let occupant = match occupant {
                Some(occupant) => occupant,
                None => continue,
            };

            let counts = if occupant.owner == world.me { &mut friends_near } else { &mut enemies_near };
            for_each_within(grid, cell, rules.inspiration_radius, |n| counts[n] += 1);

            if occupant.owner != world.me {
                for d in Direction::ALL {
                    let n = grid.neighbor(cell, d);
                    let threat = &mut lightest_threat[n];
                    *threat = Some(threat.map_or(occupant.cargo, |cargo| cargo.min(occupant.cargo)));
                }
            }
        }

        let inspired: Vec<bool> =
            enemies_near.iter()
            .map(|&enemies| inspiration_enabled && enemies >= rules.inspiration_ship_count)
            .collect();

        let density: Vec<i64> = (0..num_cells).map(|cell| {
            let mut sum = 0i64;
            for_each_within(grid, cell, DENSITY_RADIUS, |n| sum += grid.halite_at(n) as i64);
            sum
        }).collect();

        Self {
            lightest_threat: lightest_threat.into_boxed_slice(),
            enemies_near: enemies_near.into_boxed_slice(),
            friends_near: friends_near.into_boxed_slice(),
            inspired: inspired.into_boxed_slice(),
            density: density.into_boxed_slice(),
        }
    }

    pub fn is_threatened(&self, cell: usize) -> bool { self.lightest_threat[cell].is_some() }

    pub fn lightest_threat(&self, cell: usize) -> Option<i32> { self.lightest_threat[cell] }

    pub fn enemies_near(&self, cell: usize) -> i32 { self.enemies_near[cell] }

    pub fn friends_near(&self, cell: usize) -> i32 { self.friends_near[cell] }

    pub fn is_inspired(&self, cell: usize) -> bool { self.inspired[cell] }

    pub fn density(&self, cell: usize) -> i64 { self.density[cell] }
}

/// Visits every cell within toroidal distance `radius` of `center`, including the center.
/// Each cell is visited once even when the diamond wraps onto itself.
pub fn for_each_within(grid: &Grid, center: usize, radius: i32, mut visit: impl FnMut(usize)) {
    let origin = grid.position(center);
    let span_x = radius.min((grid.width - 1) / 2);
    let span_y = radius.min((grid.height - 1) / 2);
    let even_x = grid.width % 2 == 0 && radius >= grid.width / 2;
    let even_y = grid.height % 2 == 0 && radius >= grid.height / 2;

    let xs = -span_x ..= span_x + even_x as i32;
    for dx in xs {
        let ys = -span_y ..= span_y + even_y as i32;
        for dy in ys {
            if dx.abs() + dy.abs() > radius { continue }
            visit(grid.index(Position::new(origin.x + dx, origin.y + dy)));
        }
    }
}

/// Number of cells within `radius`, accounting for wrap on small grids
pub fn area_within(grid: &Grid, radius: i32) -> usize {
    let mut count = 0;
    for_each_within(grid, 0, radius, |_| count += 1);
    count
}
