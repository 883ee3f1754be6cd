use super::danger::{self, DENSITY_RADIUS};
use super::inputs::*;
use super::roles::{Role, RoleBook};
use super::view::TurnContext;

/// No new structures this close to the end
const ENDGAME_TURNS: i32 = 100;

/// Units required per existing own structure before building another
const UNITS_PER_STRUCTURE: usize = 10;

/// A site needs this multiple of the average density
const DENSITY_FACTOR: f64 = 2.0;

const MAX_OWN_SPACING: i32 = 12;
const MIN_ENEMY_SPACING: i32 = 6;
const MAX_BUILDER_DISTANCE: i32 = 8;
const BUILDER_DISTANCE_PENALTY: f64 = 0.1;

#[derive(Clone,Debug,PartialEq)]
pub struct DropoffPlan {
    pub builder: UnitId,
    pub site: usize,

    /// Halite the bank must cover when converting
    pub cost: i32,

    /// The builder stands on the site and the bank can pay now
    pub convert: bool,
}
impl DropoffPlan {
    pub fn is_saving(&self) -> bool { !self.convert }
}

pub fn is_enabled(ctx: &TurnContext) -> bool {
    ctx.config.dropoffs
    && ctx.world.remaining_turns() > ENDGAME_TURNS
    && ctx.fleet_size() >= UNITS_PER_STRUCTURE * ctx.own_structures.len()
}

/// Chooses at most one drop structure site and the unit to build it
pub fn plan(ctx: &TurnContext, roles: &RoleBook) -> Option<DropoffPlan> {
    if !is_enabled(ctx) { return None }

    let grid = ctx.grid();
    let rules = ctx.rules();

    let area = danger::area_within(grid, DENSITY_RADIUS) as f64;
    let mean_density = grid.total_halite() as f64 / grid.num_cells() as f64 * area;
    let min_density = DENSITY_FACTOR * mean_density;
    let own_spacing = MAX_OWN_SPACING.min(grid.width / 3);

    let builders: Vec<&Unit> =
        ctx.me().units.iter()
        .filter(|unit| roles.role(unit.id) != Role::EmergencyReturn)
        .collect();
    if builders.is_empty() { return None }

    let mut best: Option<(f64, usize, &Unit, i32)> = None;
    for site in 0..grid.num_cells() {
        if ctx.structure_at(site).is_some() { continue }

        let density = ctx.danger.density(site) as f64;
        if density <= 0.0 || density < min_density { continue }
        if ctx.distance_to_structure(site) < own_spacing { continue }
        if ctx.distance_to_enemy_structure(site) < MIN_ENEMY_SPACING { continue }

        let closest = builders.iter()
            .map(|&unit| (grid.cell_distance(ctx.cell_of(unit), site), unit))
            .min_by_key(|&(distance, unit)| (distance, unit.id));
        let (distance, builder) = match closest {
            Some(closest) => closest,
            None => continue,
        };
        if distance > MAX_BUILDER_DISTANCE { continue }

        let score = density / (1.0 + BUILDER_DISTANCE_PENALTY * distance as f64);
        if best.as_ref().map_or(true, |&(best_score, ..)| score > best_score) {
            best = Some((score, site, builder, distance));
        }
    }

    let (score, site, builder, distance) = best?;
    let cost = (rules.dropoff_cost - builder.cargo - grid.halite_at(site)).max(0);
    let convert = distance == 0 && ctx.me().halite >= cost;

    tracing::debug!(
        site = %grid.position(site), builder = builder.id, distance, score, cost, convert,
        "drop structure planned");

    Some(DropoffPlan {
        builder: builder.id,
        site,
        cost,
        convert,
    })
}
