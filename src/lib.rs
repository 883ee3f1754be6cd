pub mod agent;
pub mod config;
pub mod danger;
pub mod deadline;
pub mod dropoffs;
pub mod inputs;
pub mod interface;
pub mod movement;
pub mod pathing;
pub mod planning;
pub mod roles;
pub mod simulation;
pub mod solving;
pub mod valuation;
pub mod view;
