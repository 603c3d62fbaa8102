//! Rockets that learn to hit a target through a generational genetic algorithm.
//!
//! [`world::World`] drives the loop: every rocket flies a fixed genome of
//! thrust vectors, gets scored against the target, and the population breeds
//! the next set of genomes by roulette-wheel selection, single-point crossover
//! and per-gene mutation. [`sim::SimulationPlugin`] hosts the world inside a
//! Bevy app.

pub mod config;
pub mod genome;
pub mod population;
pub mod rocket;
pub mod sim;
pub mod world;
