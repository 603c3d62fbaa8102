use crate::config::SimulationConfig;
use crate::genome::{Genome, ThrustRange};
use crate::rocket::Rocket;
use bevy::prelude::*;
use rand::Rng;
use tracing::debug;

/// Min-max scale fitness values into `[0, 1]`.
///
/// When every value is equal (including a single value) each maps to `1.0`.
pub fn normalized_fitnesses(fitnesses: &[f32]) -> Vec<f32> {
    let min = fitnesses.iter().copied().fold(f32::INFINITY, f32::min);
    let max = fitnesses.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max > min {
        fitnesses.iter().map(|f| (f - min) / (max - min)).collect()
    } else {
        vec![1.0; fitnesses.len()]
    }
}

/// Fitness-proportionate pick over already normalized weights
pub fn roulette_wheel_index<R: Rng>(normalized: &[f32], rng: &mut R) -> Option<usize> {
    if normalized.is_empty() {
        return None;
    }

    let total: f32 = normalized.iter().sum();
    // No signal to select on, fall back to a uniform draw
    if !total.is_finite() || total <= 0.0 {
        return Some(rng.gen_range(0..normalized.len()));
    }

    let pick = rng.gen_range(0.0..=total);
    let mut running = 0.0;
    for (i, weight) in normalized.iter().enumerate() {
        running += weight;
        if running >= pick {
            return Some(i);
        }
    }

    // Accumulated rounding can leave the sum a hair short of `pick`
    Some(normalized.len() - 1)
}

/// The genome pool: one genome per launch slot, bred anew each generation
#[derive(Debug, Clone)]
pub struct Population {
    start_positions: Vec<Vec2>,
    dna_length: usize,
    mutation_rate: f32,
    thrust: ThrustRange,
    genomes: Vec<Genome>,
}

impl Population {
    pub fn new<R: Rng>(
        start_positions: Vec<Vec2>,
        dna_length: usize,
        mutation_rate: f32,
        thrust: ThrustRange,
        rng: &mut R,
    ) -> Self {
        let genomes = start_positions
            .iter()
            .map(|_| Genome::random(dna_length, thrust, rng))
            .collect();
        Self {
            start_positions,
            dna_length,
            mutation_rate,
            thrust,
            genomes,
        }
    }

    pub fn from_config<R: Rng>(config: &SimulationConfig, rng: &mut R) -> Self {
        let start_positions = config
            .start_positions()
            .into_iter()
            .map(|(x, y)| Vec2::new(x, y))
            .collect();
        Self::new(
            start_positions,
            config.dna_length,
            config.mutation_rate,
            ThrustRange::new(config.min_thrust, config.max_thrust),
            rng,
        )
    }

    /// Sum of raw fitness, for reporting only
    pub fn fitness_sum(rockets: &[&Rocket]) -> f32 {
        rockets.iter().map(|r| r.fitness).sum()
    }

    /// Roulette-wheel selection over the rockets' normalized fitness
    pub fn roulette_wheel_select<R: Rng>(rockets: &[&Rocket], rng: &mut R) -> Option<usize> {
        let fitnesses: Vec<f32> = rockets.iter().map(|r| r.fitness).collect();
        roulette_wheel_index(&normalized_fitnesses(&fitnesses), rng)
    }

    /// Breed the next genome pool from a finished generation.
    ///
    /// Each slot draws two parents with replacement, crosses them over and
    /// mutates the child. An empty generation reseeds every slot at random.
    pub fn next_generation<R: Rng>(&mut self, rockets: &[&Rocket], rng: &mut R) {
        if rockets.is_empty() {
            debug!(slots = self.start_positions.len(), "no rockets to breed from, reseeding");
            self.genomes = self
                .start_positions
                .iter()
                .map(|_| Genome::random(self.dna_length, self.thrust, rng))
                .collect();
            return;
        }

        let fitnesses: Vec<f32> = rockets.iter().map(|r| r.fitness).collect();
        let weights = normalized_fitnesses(&fitnesses);

        let mut genomes = Vec::with_capacity(self.start_positions.len());
        for _ in &self.start_positions {
            let first = roulette_wheel_index(&weights, rng);
            let second = roulette_wheel_index(&weights, rng);
            let child = match (first, second) {
                (Some(a), Some(b)) => rockets[a]
                    .genome()
                    .crossover(rockets[b].genome(), rng)
                    .mutate(self.mutation_rate, self.thrust, rng),
                _ => Genome::random(self.dna_length, self.thrust, rng),
            };
            genomes.push(child);
        }
        self.genomes = genomes;
    }

    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    pub fn start_positions(&self) -> &[Vec2] {
        &self.start_positions
    }

    pub fn dna_length(&self) -> usize {
        self.dna_length
    }

    pub fn mutation_rate(&self) -> f32 {
        self.mutation_rate
    }
}
