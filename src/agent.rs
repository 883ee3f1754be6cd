use rand::prelude::*;
use std::collections::BTreeMap;

use super::config::Config;
use super::deadline::Deadline;
use super::dropoffs::{self, DropoffPlan};
use super::inputs::*;
use super::movement::{self, Resolved};
use super::planning::{self, Order};
use super::roles::{Role, RoleBook};
use super::simulation::{self, WalkRequest};
use super::valuation::{self, Fields};
use super::view::TurnContext;

/// Spawning stops after this fraction of the game
const SPAWN_CUTOFF_FRACTION: f64 = 0.55;

pub struct Agent {
    config: Config,
    roles: RoleBook,
    rng: StdRng,
}
impl Agent {
    pub fn new(config: Config) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.effective_seed()),
            roles: RoleBook::new(),
            config,
        }
    }

    pub fn roles(&self) -> &RoleBook { &self.roles }

    pub fn act(&mut self, world: &WorldState, deadline: &Deadline) -> Vec<Action> {
        let mut ctx = TurnContext::new(world, &self.config);
        self.roles.begin_turn(world);
        self.roles.update(&ctx);

        let mut actions = Vec::new();

        let dropoff = dropoffs::plan(&ctx, &self.roles);
        let mut converting = None;
        match &dropoff {
            Some(plan) if plan.convert => {
                actions.push(Action::Convert { unit: plan.builder });
                converting = Some(plan.builder);
                ctx.add_provisional_structure(plan.site);
                self.roles.release_builders(None);
            },
            Some(plan) => {
                self.roles.set_role(plan.builder, Role::BuildingDropoff);
                self.roles.release_builders(Some(plan.builder));
            },
            None => self.roles.release_builders(None),
        }

        let fields = Fields::generate(&ctx);
        let units: Vec<&Unit> = ctx.me().units.iter().filter(|unit| Some(unit.id) != converting).collect();

        let gatherers: Vec<&Unit> =
            units.iter().copied()
            .filter(|unit| self.roles.role(unit.id) == Role::Gathering)
            .collect();
        let candidates = valuation::select_candidates(&ctx, &fields, &gatherers);
        let targets = planning::assign_targets(&candidates);

        let orders = build_orders(&ctx, &fields, &self.roles, &mut self.rng, &units, &targets, dropoff.as_ref(), deadline);
        let resolved = movement::resolve_moves(&orders, &ctx);
        for order in orders.iter() {
            tracing::debug!(order = %order, costs = ?order.costs, "order");
        }
        for r in resolved.iter() {
            actions.push(Action::Move { unit: r.unit, direction: r.direction });
        }

        let reserved = dropoff.as_ref().map_or(0, |plan| plan.cost);
        let saving = dropoff.as_ref().map_or(false, |plan| plan.is_saving());
        if should_spawn(&ctx, reserved, saving, &resolved) {
            actions.push(Action::Spawn);
        }

        let me = ctx.me();
        tracing::info!(
            turn = world.turn,
            bank = me.halite,
            fleet = me.units.len(),
            structures = ctx.own_structures.len(),
            gathering = self.roles.count(Role::Gathering),
            returning = self.roles.count(Role::Returning),
            emergency = self.roles.count(Role::EmergencyReturn),
            building = self.roles.count(Role::BuildingDropoff),
            elapsed_ms = deadline.elapsed().as_millis() as u64,
            "turn complete");

        actions
    }
}

#[allow(clippy::too_many_arguments)]
fn build_orders(
    ctx: &TurnContext,
    fields: &Fields,
    roles: &RoleBook,
    rng: &mut StdRng,
    units: &[&Unit],
    targets: &BTreeMap<UnitId, usize>,
    dropoff: Option<&DropoffPlan>,
    deadline: &Deadline) -> Vec<Order> {

    let grid = ctx.grid();
    let rules = ctx.rules();

    let mut walks_left = units.iter().filter(|unit| roles.role(unit.id) == Role::Gathering).count();
    let mut orders = Vec::with_capacity(units.len());
    for &unit in units.iter() {
        let role = roles.role(unit.id);
        let cell = ctx.cell_of(unit);
        let field = fields.unit(unit.id);

        let home = ctx.closest_structure(cell).unwrap_or(cell);
        let destination = match role {
            Role::Gathering => targets.get(&unit.id).copied().unwrap_or(cell),
            Role::Returning | Role::EmergencyReturn => home,
            Role::BuildingDropoff => dropoff.filter(|plan| plan.builder == unit.id).map_or(home, |plan| plan.site),
        };

        let mut costs = match (role, field) {
            (Role::Gathering, Some(field)) if deadline.is_expired() => {
                walks_left = walks_left.saturating_sub(1);
                planning::rank_costs(field, grid, destination)
            },
            (Role::Gathering, _) => {
                let request = WalkRequest {
                    grid,
                    rules,
                    danger: &ctx.danger,
                    inspiration: ctx.inspiration_enabled(),
                    start: cell,
                    destination,
                    cargo: unit.cargo,
                    mine_threshold: ctx.mine_threshold,
                };
                let budget = deadline.share(walks_left);
                walks_left = walks_left.saturating_sub(1);
                let result = simulation::refine(&request, rng, budget);
                simulation::direction_costs(&result)
            },
            (_, Some(field)) => planning::rank_costs(field, grid, destination),
            (_, None) => planning::frozen_costs(),
        };

        let policy = movement::policy_for(role, unit.cargo, rules, ctx.num_players());
        let allowed = movement::allowed_offsets(unit, policy, roles.is_stuck(unit.id), ctx);
        movement::restrict(&mut costs, allowed);

        orders.push(Order {
            unit: unit.id,
            cell,
            destination,
            role,
            costs,
            priority: planning::priority_of(role),
            may_stack: role == Role::EmergencyReturn,
        });
    }
    orders
}

/// Whether to build a new unit at the shipyard this turn
pub fn should_spawn(ctx: &TurnContext, reserved: i32, saving: bool, resolved: &[Resolved]) -> bool {
    let world = ctx.world;
    let rules = ctx.rules();
    let me = ctx.me();

    let yard = match me.shipyard() {
        Some(yard) => ctx.grid().index(yard.position),
        None => return false,
    };

    if saving { return false }
    if me.halite - reserved < rules.unit_cost { return false }
    if world.turn as f64 >= rules.max_turns as f64 * SPAWN_CUTOFF_FRACTION { return false }
    if ctx.enemy_at(yard).is_some() { return false }
    if resolved.iter().any(|r| r.destination == yard) { return false }
    if let Some(limit) = ctx.config.fixed_fleet {
        if me.units.len() >= limit { return false }
    }
    true
}
