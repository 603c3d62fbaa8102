/// Configuration constants and run parameters for the rocket simulator
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// GENOME SETTINGS
// ============================================================================

/// Number of thrust instructions in each rocket's genome
pub const DEFAULT_DNA_LENGTH: usize = 100;

/// Probability per gene of being replaced with a fresh random gene
pub const DEFAULT_MUTATION_RATE: f32 = 0.1;

/// Smallest thrust magnitude a gene can carry
pub const MIN_THRUST_MAGNITUDE: f32 = 0.1;

/// Largest thrust magnitude a gene can carry
pub const MAX_THRUST_MAGNITUDE: f32 = 0.5;

// ============================================================================
// POPULATION & GENERATION SETTINGS
// ============================================================================

/// Number of rockets (and start positions) per generation
pub const DEFAULT_POPULATION_SIZE: usize = 50;

/// Steps a generation may run past the genome length before it is cut off
pub const EXTRA_GENERATION_STEPS: usize = 50;

/// Distance of the start line above the bottom edge of the world
pub const START_OFFSET_Y: f32 = 50.0;

// ============================================================================
// PHYSICS
// ============================================================================

/// Velocity multiplier applied every step (2% loss per frame)
pub const VELOCITY_DAMPING: f32 = 0.98;

/// Hard cap on rocket speed
pub const MAX_VELOCITY: f32 = 10.0;

/// Number of recent positions kept in a rocket's trail
pub const MAX_TRAIL_LENGTH: usize = 50;

/// Drawn radius of a rocket
pub const ROCKET_RADIUS: f32 = 5.0;

// ============================================================================
// FITNESS
// ============================================================================

/// Radius of the target unless one is given explicitly
pub const TARGET_RADIUS: f32 = 20.0;

/// Flat reward for reaching the target
pub const FITNESS_TARGET_REWARD: f32 = 1000.0;

/// Bonus per unused genome instruction at the moment of arrival
pub const FITNESS_BONUS_PER_STEP: f32 = 10.0;

/// Fitness multiplier for rockets outside the world rectangle
pub const OUT_OF_BOUNDS_PENALTY: f32 = 0.1;

// ============================================================================
// WORLD & PRESENTATION
// ============================================================================

/// Width of the simulated area in world units (pixels in the app)
pub const WORLD_WIDTH: f32 = 1200.0;

/// Height of the simulated area in world units
pub const WORLD_HEIGHT: f32 = 800.0;

/// Mutation rate used by the interactive app
pub const APP_MUTATION_RATE: f32 = 0.03;

/// Environment variable read by the app for a reproducible seed
pub const SEED_ENV_VAR: &str = "ROCKETS_SEED";

/// Errors raised when a [`SimulationConfig`] cannot drive a simulation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("dna_length must be non-zero")]
    ZeroDnaLength,
    #[error("mutation rate {rate} must be between 0.0 and 1.0")]
    InvalidMutationRate { rate: f32 },
    #[error("thrust range [{min}, {max}] must be finite and non-negative with min <= max")]
    InvalidThrustRange { min: f32, max: f32 },
    #[error("velocity damping {damping} must be in (0.0, 1.0]")]
    InvalidDamping { damping: f32 },
    #[error("max velocity {max} must be positive and finite")]
    InvalidMaxVelocity { max: f32 },
    #[error("world size {width}x{height} must be positive and finite")]
    InvalidWorldSize { width: f32, height: f32 },
    #[error("target radius {radius} must be non-negative and finite")]
    InvalidTargetRadius { radius: f32 },
    #[error("fitness parameter {name} = {value} must be non-negative and finite")]
    InvalidFitnessParameter { name: &'static str, value: f32 },
}

fn non_negative_finite(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

/// Run parameters for a [`crate::world::World`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: f32,
    pub height: f32,
    pub population_size: usize,
    pub dna_length: usize,
    pub mutation_rate: f32,
    pub min_thrust: f32,
    pub max_thrust: f32,
    pub velocity_damping: f32,
    pub max_velocity: f32,
    pub max_trail_length: usize,
    pub rocket_radius: f32,
    pub target_radius: f32,
    pub target_reward: f32,
    pub bonus_per_step: f32,
    pub out_of_bounds_penalty: f32,
    pub extra_generation_steps: usize,
    pub start_offset_y: f32,
    /// Seed for the shared random source; `None` draws one from entropy
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            population_size: DEFAULT_POPULATION_SIZE,
            dna_length: DEFAULT_DNA_LENGTH,
            mutation_rate: DEFAULT_MUTATION_RATE,
            min_thrust: MIN_THRUST_MAGNITUDE,
            max_thrust: MAX_THRUST_MAGNITUDE,
            velocity_damping: VELOCITY_DAMPING,
            max_velocity: MAX_VELOCITY,
            max_trail_length: MAX_TRAIL_LENGTH,
            rocket_radius: ROCKET_RADIUS,
            target_radius: TARGET_RADIUS,
            target_reward: FITNESS_TARGET_REWARD,
            bonus_per_step: FITNESS_BONUS_PER_STEP,
            out_of_bounds_penalty: OUT_OF_BOUNDS_PENALTY,
            extra_generation_steps: EXTRA_GENERATION_STEPS,
            start_offset_y: START_OFFSET_Y,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dna_length == 0 {
            return Err(ConfigError::ZeroDnaLength);
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::InvalidMutationRate {
                rate: self.mutation_rate,
            });
        }
        // NaN fails every comparison, so it lands here too
        if !(non_negative_finite(self.min_thrust)
            && self.max_thrust.is_finite()
            && self.min_thrust <= self.max_thrust)
        {
            return Err(ConfigError::InvalidThrustRange {
                min: self.min_thrust,
                max: self.max_thrust,
            });
        }
        if !(self.velocity_damping > 0.0 && self.velocity_damping <= 1.0) {
            return Err(ConfigError::InvalidDamping {
                damping: self.velocity_damping,
            });
        }
        if !(self.max_velocity.is_finite() && self.max_velocity > 0.0) {
            return Err(ConfigError::InvalidMaxVelocity {
                max: self.max_velocity,
            });
        }
        if !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
        {
            return Err(ConfigError::InvalidWorldSize {
                width: self.width,
                height: self.height,
            });
        }
        if !non_negative_finite(self.target_radius) {
            return Err(ConfigError::InvalidTargetRadius {
                radius: self.target_radius,
            });
        }
        for (name, value) in [
            ("target_reward", self.target_reward),
            ("bonus_per_step", self.bonus_per_step),
            ("out_of_bounds_penalty", self.out_of_bounds_penalty),
        ] {
            if !non_negative_finite(value) {
                return Err(ConfigError::InvalidFitnessParameter { name, value });
            }
        }
        Ok(())
    }

    /// Steps after which a generation ends regardless of rocket state.
    pub fn max_steps_per_generation(&self) -> usize {
        self.dna_length + self.extra_generation_steps
    }

    /// Evenly spaced launch points along the bottom of the world.
    pub fn start_positions(&self) -> Vec<(f32, f32)> {
        let slots = self.population_size as f32 + 1.0;
        (0..self.population_size)
            .map(|i| {
                let x = ((i as f32 + 1.0) * self.width / slots).trunc();
                (x, self.height - self.start_offset_y)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_unusable_parameters() {
        let config = SimulationConfig {
            dna_length: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDnaLength));

        let config = SimulationConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidMutationRate { rate: 1.5 })
        );

        let config = SimulationConfig {
            min_thrust: 0.6,
            max_thrust: 0.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThrustRange { .. })
        ));

        for (min_thrust, max_thrust) in [(0.1, f32::INFINITY), (f32::NAN, 0.5), (-0.1, 0.5)] {
            let config = SimulationConfig {
                min_thrust,
                max_thrust,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidThrustRange { .. })
            ));
        }

        let config = SimulationConfig {
            max_velocity: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaxVelocity { .. })
        ));

        let config = SimulationConfig {
            height: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorldSize { .. })
        ));

        let config = SimulationConfig {
            target_radius: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTargetRadius { .. })
        ));

        let config = SimulationConfig {
            target_reward: f32::INFINITY,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidFitnessParameter {
                name: "target_reward",
                value: f32::INFINITY
            })
        );

        let config = SimulationConfig {
            bonus_per_step: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFitnessParameter { name: "bonus_per_step", .. })
        ));

        let config = SimulationConfig {
            out_of_bounds_penalty: -0.1,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidFitnessParameter {
                name: "out_of_bounds_penalty",
                value: -0.1
            })
        );

        let config = SimulationConfig {
            velocity_damping: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDamping { .. })
        ));

        let config = SimulationConfig {
            width: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorldSize { .. })
        ));
    }

    #[test]
    fn start_positions_are_spread_along_the_bottom() {
        let config = SimulationConfig {
            width: 400.0,
            height: 300.0,
            population_size: 3,
            ..Default::default()
        };
        let positions = config.start_positions();
        assert_eq!(positions, vec![(100.0, 250.0), (200.0, 250.0), (300.0, 250.0)]);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "population_size": 7, "seed": 3 }"#).unwrap();
        assert_eq!(config.population_size, 7);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.dna_length, DEFAULT_DNA_LENGTH);
        assert_eq!(config.max_steps_per_generation(), DEFAULT_DNA_LENGTH + EXTRA_GENERATION_STEPS);
    }
}
