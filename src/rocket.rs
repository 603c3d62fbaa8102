use crate::config::SimulationConfig;
use crate::genome::Genome;
use bevy::prelude::*;
use serde::Serialize;
use std::collections::VecDeque;

/// Per-rocket physics and scoring constants, copied out of the run config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocketParams {
    pub velocity_damping: f32,
    pub max_velocity: f32,
    pub max_trail_length: usize,
    pub radius: f32,
    pub target_reward: f32,
    pub bonus_per_step: f32,
}

impl From<&SimulationConfig> for RocketParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            velocity_damping: config.velocity_damping,
            max_velocity: config.max_velocity,
            max_trail_length: config.max_trail_length,
            radius: config.rocket_radius,
            target_reward: config.target_reward,
            bonus_per_step: config.bonus_per_step,
        }
    }
}

impl Default for RocketParams {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

/// A rocket flies its genome one thrust instruction per step
#[derive(Debug, Clone)]
pub struct Rocket {
    pub pos: Vec2,
    pub vel: Vec2,
    pub acc: Vec2,
    pub fitness: f32,
    pub is_active: bool,
    genome: Genome,
    current_step: usize,
    reached_target_at: Option<usize>,
    trail: VecDeque<Vec2>,
    params: RocketParams,
}

impl Rocket {
    pub fn new(start: Vec2, genome: Genome, params: RocketParams) -> Self {
        Self {
            pos: start,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            fitness: 0.0,
            is_active: true,
            genome,
            current_step: 0,
            reached_target_at: None,
            trail: VecDeque::with_capacity(params.max_trail_length + 1),
            params,
        }
    }

    /// Advance one simulation step: thrust, integrate, record trail
    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        self.apply_thrust();
        self.integrate();
        self.record_trail();
    }

    fn apply_thrust(&mut self) {
        match self.genome.gene(self.current_step) {
            Some(thrust) => {
                self.acc = thrust;
                self.current_step += 1;
            }
            // Out of fuel, keep drifting
            None => self.acc = Vec2::ZERO,
        }
    }

    fn integrate(&mut self) {
        self.vel += self.acc;
        self.vel *= self.params.velocity_damping;
        self.vel = self.vel.clamp_length_max(self.params.max_velocity);
        self.pos += self.vel;
    }

    fn record_trail(&mut self) {
        self.trail.push_back(self.pos);
        while self.trail.len() > self.params.max_trail_length {
            self.trail.pop_front();
        }
    }

    /// Recompute fitness against a target. Safe to call any number of times.
    ///
    /// The first call that finds the rocket inside the target radius pins the
    /// arrival step; later calls never move it.
    pub fn evaluate_fitness(&mut self, target_pos: Vec2, target_radius: f32) {
        let distance = self.pos.distance(target_pos);

        if distance <= target_radius && self.reached_target_at.is_none() {
            self.reached_target_at = Some(self.current_step);
        }

        self.fitness = match self.reached_target_at {
            Some(step) => {
                let steps_remaining = self.genome.len().saturating_sub(step);
                self.params.target_reward + steps_remaining as f32 * self.params.bonus_per_step
            }
            None => 1.0 / (distance + f32::EPSILON),
        };
    }

    pub fn has_reached_target(&self) -> bool {
        self.reached_target_at.is_some()
    }

    /// Step cursor at the moment of first arrival
    pub fn target_reached_step(&self) -> Option<usize> {
        self.reached_target_at
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn dna_length(&self) -> usize {
        self.genome.len()
    }

    pub fn fuel_remaining(&self) -> usize {
        self.genome.len().saturating_sub(self.current_step)
    }

    /// Still burning fuel and not yet at the target
    pub fn is_running(&self) -> bool {
        self.current_step < self.genome.len() && !self.has_reached_target()
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn trail(&self) -> impl ExactSizeIterator<Item = Vec2> + '_ {
        self.trail.iter().copied()
    }

    pub fn radius(&self) -> f32 {
        self.params.radius
    }

    pub fn state(&self) -> RocketState {
        RocketState {
            pos: self.pos.to_array(),
            vel: self.vel.to_array(),
            acc: self.acc.to_array(),
            fitness: self.fitness,
            trail: self.trail.iter().map(|p| p.to_array()).collect(),
            radius: self.params.radius,
            is_active: self.is_active,
            has_reached_target: self.has_reached_target(),
            current_step: self.current_step,
            dna_length: self.genome.len(),
            fuel_remaining: self.fuel_remaining(),
        }
    }
}

/// The goal the rockets steer toward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub pos: Vec2,
    pub radius: f32,
}

impl Target {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self { pos, radius }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.radius
    }

    pub fn state(&self) -> TargetState {
        TargetState {
            pos: self.pos.to_array(),
            radius: self.radius,
        }
    }
}

/// Anything living in the world that updates each step and reports state
#[derive(Debug, Clone)]
pub enum Body {
    Target(Target),
    Rocket(Rocket),
}

impl Body {
    pub fn update(&mut self) {
        match self {
            // Targets only move when relocated from outside
            Body::Target(_) => {}
            Body::Rocket(rocket) => rocket.update(),
        }
    }

    pub fn state(&self) -> BodyState {
        match self {
            Body::Target(target) => BodyState::Target(target.state()),
            Body::Rocket(rocket) => BodyState::Rocket(rocket.state()),
        }
    }

    pub fn as_rocket(&self) -> Option<&Rocket> {
        match self {
            Body::Rocket(rocket) => Some(rocket),
            Body::Target(_) => None,
        }
    }

    pub fn as_rocket_mut(&mut self) -> Option<&mut Rocket> {
        match self {
            Body::Rocket(rocket) => Some(rocket),
            Body::Target(_) => None,
        }
    }

    pub fn as_target(&self) -> Option<&Target> {
        match self {
            Body::Target(target) => Some(target),
            Body::Rocket(_) => None,
        }
    }
}

/// Serializable snapshot of a rocket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocketState {
    pub pos: [f32; 2],
    pub vel: [f32; 2],
    pub acc: [f32; 2],
    pub fitness: f32,
    pub trail: Vec<[f32; 2]>,
    pub radius: f32,
    pub is_active: bool,
    pub has_reached_target: bool,
    pub current_step: usize,
    pub dna_length: usize,
    pub fuel_remaining: usize,
}

/// Serializable snapshot of the target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetState {
    pub pos: [f32; 2],
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyState {
    Target(TargetState),
    Rocket(RocketState),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FITNESS_BONUS_PER_STEP, FITNESS_TARGET_REWARD};
    use crate::genome::ThrustRange;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn still_rocket(pos: Vec2) -> Rocket {
        Rocket::new(pos, Genome::new(vec![Vec2::ZERO; 10]), RocketParams::default())
    }

    #[test]
    fn consumes_one_gene_per_step_then_drifts() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let genome = Genome::random(10, ThrustRange::default(), &mut rng);
        let mut rocket = Rocket::new(Vec2::new(100.0, 100.0), genome.clone(), RocketParams::default());

        for step in 0..10 {
            rocket.update();
            assert_eq!(rocket.acc, genome.genes[step]);
        }
        assert_eq!(rocket.current_step(), 10);
        assert_eq!(rocket.fuel_remaining(), 0);
        assert_eq!(rocket.trail().len(), 10);

        let vel_before = rocket.vel;
        let pos_before = rocket.pos;
        rocket.update();
        assert_eq!(rocket.acc, Vec2::ZERO);
        assert_eq!(rocket.current_step(), 10);
        assert_eq!(rocket.vel, vel_before * 0.98);
        assert_eq!(rocket.pos, pos_before + rocket.vel);
    }

    #[test]
    fn velocity_is_damped_then_capped() {
        let genome = Genome::new(vec![Vec2::new(30.0, 40.0), Vec2::new(0.1, 0.0)]);
        let mut rocket = Rocket::new(Vec2::ZERO, genome, RocketParams::default());
        rocket.update();
        // 50 * 0.98 = 49, capped to 10 along (0.6, 0.8)
        assert!((rocket.vel.length() - 10.0).abs() < 1e-4);
        assert!((rocket.vel.x - 6.0).abs() < 1e-4);
        assert!((rocket.vel.y - 8.0).abs() < 1e-4);
        assert_eq!(rocket.pos, rocket.vel);

        let small = Genome::new(vec![Vec2::new(0.5, 0.0)]);
        let mut rocket = Rocket::new(Vec2::ZERO, small, RocketParams::default());
        rocket.update();
        assert!((rocket.vel.x - 0.49).abs() < 1e-6);
    }

    #[test]
    fn trail_keeps_only_most_recent_positions() {
        let params = RocketParams {
            max_trail_length: 3,
            ..Default::default()
        };
        let genome = Genome::new(vec![Vec2::new(1.0, 0.0); 6]);
        let mut rocket = Rocket::new(Vec2::ZERO, genome, params);
        let mut positions = Vec::new();
        for _ in 0..6 {
            rocket.update();
            positions.push(rocket.pos);
        }
        let trail: Vec<Vec2> = rocket.trail().collect();
        assert_eq!(trail, positions[3..].to_vec());
    }

    #[test]
    fn inactive_rocket_does_not_move() {
        let mut rocket = Rocket::new(Vec2::ZERO, Genome::new(vec![Vec2::X; 3]), RocketParams::default());
        rocket.is_active = false;
        rocket.update();
        assert_eq!(rocket.pos, Vec2::ZERO);
        assert_eq!(rocket.current_step(), 0);
        assert_eq!(rocket.trail().len(), 0);
    }

    #[test]
    fn arrival_within_radius_earns_reward() {
        let mut rocket = still_rocket(Vec2::new(115.0, 100.0));
        rocket.evaluate_fitness(Vec2::new(100.0, 100.0), 20.0);
        assert!(rocket.has_reached_target());
        assert_eq!(rocket.target_reached_step(), Some(0));
        assert!(rocket.fitness >= FITNESS_TARGET_REWARD);
        assert_eq!(rocket.fitness, FITNESS_TARGET_REWARD + 10.0 * FITNESS_BONUS_PER_STEP);
    }

    #[test]
    fn first_arrival_step_is_never_overwritten() {
        let mut rocket = still_rocket(Vec2::ZERO);
        rocket.update();
        rocket.update();
        rocket.evaluate_fitness(Vec2::ZERO, 20.0);
        assert_eq!(rocket.target_reached_step(), Some(2));

        rocket.update();
        rocket.evaluate_fitness(Vec2::ZERO, 20.0);
        assert_eq!(rocket.target_reached_step(), Some(2));

        // Still counts as reached after leaving the target
        rocket.pos = Vec2::new(500.0, 500.0);
        rocket.evaluate_fitness(Vec2::ZERO, 20.0);
        assert!(rocket.has_reached_target());
        assert_eq!(rocket.fitness, FITNESS_TARGET_REWARD + 8.0 * FITNESS_BONUS_PER_STEP);
    }

    #[test]
    fn fitness_grows_as_distance_shrinks() {
        let target = Vec2::ZERO;
        let mut a = still_rocket(Vec2::new(300.0, 0.0));
        let mut b = still_rocket(Vec2::new(0.0, 300.0));
        let mut c = still_rocket(Vec2::new(100.0, 0.0));
        a.evaluate_fitness(target, 20.0);
        b.evaluate_fitness(target, 20.0);
        c.evaluate_fitness(target, 20.0);
        assert_eq!(a.fitness, b.fitness);
        assert!(c.fitness > a.fitness);
        assert!(!c.has_reached_target());
    }

    #[test]
    fn reaching_target_beats_any_near_miss() {
        let target = Vec2::ZERO;
        let mut near_miss = still_rocket(Vec2::new(20.01, 0.0));
        near_miss.evaluate_fitness(target, 20.0);

        let mut late = still_rocket(Vec2::new(10.0, 0.0));
        for _ in 0..10 {
            late.update();
        }
        late.evaluate_fitness(target, 20.0);
        assert_eq!(late.fitness, FITNESS_TARGET_REWARD);
        assert!(late.fitness > near_miss.fitness);
    }

    #[test]
    fn zero_distance_without_radius_stays_finite() {
        let mut rocket = still_rocket(Vec2::ZERO);
        rocket.evaluate_fitness(Vec2::ZERO, -1.0);
        assert!(!rocket.has_reached_target());
        assert!(rocket.fitness.is_finite());
        assert_eq!(rocket.fitness, 1.0 / f32::EPSILON);
    }

    #[test]
    fn rocket_state_reports_fuel_and_serializes() {
        let mut rocket = still_rocket(Vec2::new(1.0, 2.0));
        rocket.update();
        let state = Body::Rocket(rocket).state();
        let BodyState::Rocket(ref rocket_state) = state else {
            panic!("expected rocket state");
        };
        assert_eq!(rocket_state.current_step, 1);
        assert_eq!(rocket_state.fuel_remaining, 9);
        assert_eq!(rocket_state.dna_length, 10);
        assert_eq!(rocket_state.trail.len(), 1);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["kind"], "rocket");
        assert_eq!(json["fuel_remaining"], 9);

        let target = Body::Target(Target::new(Vec2::new(5.0, 6.0), 20.0));
        let json = serde_json::to_value(target.state()).unwrap();
        assert_eq!(json["kind"], "target");
        assert_eq!(json["radius"], 20.0);
    }
}
