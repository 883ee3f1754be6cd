use clap::{ArgAction, Parser};
use serde::Serialize;

pub const DEFAULT_SEED: u64 = 0x1234567890abcdef;
pub const DEFAULT_TURN_BUDGET_MS: u64 = 1500;

#[derive(Clone,Debug,PartialEq,Parser,Serialize)]
#[command(name = "prospector", about = "Fleet decision engine for a toroidal harvesting game")]
pub struct Config {
    /// Value inspired cells with the density bonus
    #[arg(long = "noinspr", action = ArgAction::SetFalse, help = "Ignore the inspiration bonus")]
    pub inspiration: bool,

    /// Allow units to be converted into drop structures
    #[arg(long = "nodrop", action = ArgAction::SetFalse, help = "Never build drop structures")]
    pub dropoffs: bool,

    #[arg(long)]
    pub debug: bool,

    /// Debug mode: stop spawning once the fleet reaches this size
    #[arg(long = "ships", value_name = "COUNT")]
    pub fixed_fleet: Option<usize>,

    #[arg(long, value_name = "SEED", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Seed given as a bare number, the way the game runner passes it
    #[arg(value_name = "SEED", conflicts_with = "seed")]
    pub runner_seed: Option<u64>,

    #[arg(long = "budget", value_name = "MS", default_value_t = DEFAULT_TURN_BUDGET_MS)]
    pub turn_budget_ms: u64,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            inspiration: true,
            dropoffs: true,
            debug: false,
            fixed_fleet: None,
            seed: DEFAULT_SEED,
            runner_seed: None,
            turn_budget_ms: DEFAULT_TURN_BUDGET_MS,
        }
    }
}
impl Config {
    pub fn effective_seed(&self) -> u64 {
        self.runner_seed.unwrap_or(self.seed)
    }
}
