//! Generation lifecycle: spawn, simulate, evaluate, breed, respawn.

use crate::config::{ConfigError, SimulationConfig};
use crate::population::Population;
use crate::rocket::{Body, BodyState, Rocket, RocketParams, Target};
use bevy::prelude::{Resource, Vec2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

/// The single random source every stochastic decision draws from
pub type SimRng = ChaCha8Rng;

/// Where the current generation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GenerationPhase {
    /// Fresh rockets, not stepped yet
    Spawned,
    Simulating,
    /// Final evaluation and breeding in progress
    Ending,
}

/// Aggregate statistics, refreshed every step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationStats {
    pub current_generation: usize,
    /// Rockets that reached the target, summed over every generation so far
    pub total_rockets_reached_target: usize,
    pub rockets_reached_current_gen: usize,
    pub best_distance_achieved: f32,
    pub best_fitness_current_gen: f32,
    pub best_fitness_all_time: f32,
    pub generation_complete: bool,
}

impl Default for GenerationStats {
    fn default() -> Self {
        Self {
            current_generation: 0,
            total_rockets_reached_target: 0,
            rockets_reached_current_gen: 0,
            best_distance_achieved: f32::INFINITY,
            best_fitness_current_gen: 0.0,
            best_fitness_all_time: 0.0,
            generation_complete: false,
        }
    }
}

/// Outcome of the most recently finished generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub generation: usize,
    pub rockets: usize,
    pub reached_target: usize,
    pub best_fitness: f32,
    pub best_distance: f32,
    pub fitness_sum: f32,
    pub steps: usize,
}

#[derive(Resource)]
pub struct World {
    config: SimulationConfig,
    bodies: Vec<Body>,
    population: Population,
    rng: SimRng,
    generation: usize,
    generation_step: usize,
    max_steps_per_generation: usize,
    phase: GenerationPhase,
    stats: GenerationStats,
    reached_in_previous_gens: usize,
    last_summary: Option<GenerationSummary>,
}

impl World {
    /// Build a world around an explicit random source and spawn generation 1.
    pub fn new(config: SimulationConfig, mut rng: SimRng) -> Result<Self, ConfigError> {
        config.validate()?;

        let population = Population::from_config(&config, &mut rng);
        let max_steps_per_generation = config.max_steps_per_generation();
        let mut world = Self {
            config,
            bodies: Vec::new(),
            population,
            rng,
            generation: 0,
            generation_step: 0,
            max_steps_per_generation,
            phase: GenerationPhase::Spawned,
            stats: GenerationStats::default(),
            reached_in_previous_gens: 0,
            last_summary: None,
        };
        world.spawn_generation();
        Ok(world)
    }

    /// Seed from `config.seed`, or from entropy when none is set.
    pub fn seeded(config: SimulationConfig) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => SimRng::seed_from_u64(seed),
            None => SimRng::from_entropy(),
        };
        Self::new(config, rng)
    }

    /// Advance the simulation one tick.
    ///
    /// Rolls straight into the next generation when the current one ends.
    pub fn step(&mut self) {
        self.stats.generation_complete = false;
        self.phase = GenerationPhase::Simulating;

        for body in &mut self.bodies {
            body.update();
        }
        self.generation_step += 1;

        self.calculate_rocket_stats();

        if self.should_end_generation() {
            self.phase = GenerationPhase::Ending;
            self.end_generation();
            self.spawn_generation();
        }
    }

    /// Replace every rocket with a fresh one built from the population's genomes.
    pub fn spawn_generation(&mut self) {
        self.bodies.retain(|body| !matches!(body, Body::Rocket(_)));

        let params = RocketParams::from(&self.config);
        let rockets = self
            .population
            .start_positions()
            .iter()
            .zip(self.population.genomes())
            .map(|(start, genome)| Body::Rocket(Rocket::new(*start, genome.clone(), params)));
        self.bodies.extend(rockets);

        self.generation_step = 0;
        self.generation += 1;
        self.phase = GenerationPhase::Spawned;

        self.reached_in_previous_gens = self.stats.total_rockets_reached_target;
        self.stats.current_generation = self.generation;
        self.stats.rockets_reached_current_gen = 0;
        self.stats.best_fitness_current_gen = 0.0;
        self.stats.best_distance_achieved = f32::INFINITY;

        info!(
            generation = self.generation,
            rockets = self.rocket_count(),
            "generation spawned"
        );
    }

    /// Score the finished generation and breed the next genome pool.
    pub fn end_generation(&mut self) {
        if let Some(target) = self.target().copied() {
            for rocket in self.bodies.iter_mut().filter_map(Body::as_rocket_mut) {
                score_rocket(rocket, &target, &self.config);
            }
        }

        let rockets: Vec<&Rocket> = self.bodies.iter().filter_map(Body::as_rocket).collect();
        for rocket in &rockets {
            if rocket.fitness > self.stats.best_fitness_all_time {
                self.stats.best_fitness_all_time = rocket.fitness;
            }
        }

        let summary = GenerationSummary {
            generation: self.generation,
            rockets: rockets.len(),
            reached_target: self.stats.rockets_reached_current_gen,
            best_fitness: self.stats.best_fitness_current_gen,
            best_distance: self.stats.best_distance_achieved,
            fitness_sum: Population::fitness_sum(&rockets),
            steps: self.generation_step,
        };

        self.population.next_generation(&rockets, &mut self.rng);
        self.stats.generation_complete = true;

        info!(
            generation = summary.generation,
            reached = summary.reached_target,
            best_fitness = summary.best_fitness,
            best_distance = summary.best_distance,
            steps = summary.steps,
            "generation complete"
        );
        self.last_summary = Some(summary);
    }

    fn should_end_generation(&self) -> bool {
        let mut rockets = self.rockets().peekable();
        if rockets.peek().is_none() {
            return true;
        }
        if self.generation_step >= self.max_steps_per_generation {
            return true;
        }
        // A rocket that reached the target counts as finished even with fuel left
        rockets.all(|rocket| !rocket.is_running())
    }

    fn calculate_rocket_stats(&mut self) {
        let Some(target) = self.target().copied() else {
            return;
        };

        let mut best_distance = f32::INFINITY;
        let mut reached = 0;
        let mut best_fitness = 0.0_f32;
        let mut any = false;

        for rocket in self.bodies.iter_mut().filter_map(Body::as_rocket_mut) {
            any = true;
            score_rocket(rocket, &target, &self.config);

            best_distance = best_distance.min(rocket.pos.distance(target.pos));
            if rocket.has_reached_target() {
                reached += 1;
            }
            best_fitness = best_fitness.max(rocket.fitness);
        }

        if !any {
            return;
        }

        self.stats.best_distance_achieved = best_distance;
        self.stats.rockets_reached_current_gen = reached;
        self.stats.best_fitness_current_gen = best_fitness;
        self.stats.total_rockets_reached_target = self.reached_in_previous_gens + reached;
    }

    /// Place the target, replacing any existing one. The generation keeps running.
    pub fn set_target(&mut self, x: f32, y: f32, radius: f32) {
        self.clear_target();
        self.bodies
            .push(Body::Target(Target::new(Vec2::new(x, y), radius)));
    }

    pub fn clear_target(&mut self) {
        self.bodies.retain(|body| !matches!(body, Body::Target(_)));
    }

    pub fn target(&self) -> Option<&Target> {
        self.bodies.iter().find_map(Body::as_target)
    }

    pub fn entities(&self) -> &[Body] {
        &self.bodies
    }

    pub fn rockets(&self) -> impl Iterator<Item = &Rocket> + '_ {
        self.bodies.iter().filter_map(Body::as_rocket)
    }

    pub fn rocket_count(&self) -> usize {
        self.rockets().count()
    }

    pub fn state(&self) -> Vec<BodyState> {
        self.bodies.iter().map(Body::state).collect()
    }

    pub fn stats(&self) -> GenerationStats {
        self.stats.clone()
    }

    /// True when the last `step` finished a generation
    pub fn is_generation_complete(&self) -> bool {
        self.stats.generation_complete
    }

    /// Fraction of the step cap used by the current generation
    pub fn generation_progress(&self) -> f32 {
        if self.max_steps_per_generation == 0 {
            return 1.0;
        }
        (self.generation_step as f32 / self.max_steps_per_generation as f32).min(1.0)
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn generation_step(&self) -> usize {
        self.generation_step
    }

    pub fn max_steps_per_generation(&self) -> usize {
        self.max_steps_per_generation
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn start_positions(&self) -> &[Vec2] {
        self.population.start_positions()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn last_summary(&self) -> Option<&GenerationSummary> {
        self.last_summary.as_ref()
    }

    pub fn is_out_of_bounds(&self, point: Vec2) -> bool {
        out_of_bounds(point, &self.config)
    }
}

fn out_of_bounds(point: Vec2, config: &SimulationConfig) -> bool {
    point.x < 0.0 || point.x > config.width || point.y < 0.0 || point.y > config.height
}

/// Fresh fitness against the target, then the boundary penalty at most once.
///
/// The end-of-generation pass scores through here as well, so the penalty
/// also reaches parent selection and the best-fitness statistics. A rocket
/// that ends outside the world breeds with a tenth of its distance fitness.
fn score_rocket(rocket: &mut Rocket, target: &Target, config: &SimulationConfig) {
    rocket.evaluate_fitness(target.pos, target.radius);
    if out_of_bounds(rocket.pos, config) {
        rocket.fitness *= config.out_of_bounds_penalty;
    }
}
