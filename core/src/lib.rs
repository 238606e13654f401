//! garden-core: a real-time idle garden simulation.
//!
//! A run is a grid of plants that yield fruit over a finite lifespan,
//! a shop selling seeds from procedurally generated tiers, and a
//! weather director that periodically helps or hurts the garden.
//! `engine::SimEngine` drives one run; everything else is a piece of it.

pub mod clock;
pub mod command;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod event;
pub mod garden;
pub mod growth_subsystem;
pub mod manifest;
pub mod plant;
pub mod rng;
pub mod run_state;
pub mod shop_subsystem;
pub mod snapshot;
pub mod store;
pub mod subsystem;
pub mod tiers;
pub mod types;
pub mod weather_subsystem;
