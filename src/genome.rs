use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

/// Inclusive magnitude range for randomly drawn thrust genes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustRange {
    pub min: f32,
    pub max: f32,
}

impl ThrustRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draw a thrust vector with uniform direction and magnitude in range
    pub fn random_gene<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let angle = rng.gen_range(0.0..TAU);
        let magnitude = rng.gen_range(self.min..=self.max);
        Vec2::new(magnitude * angle.cos(), magnitude * angle.sin())
    }
}

impl Default for ThrustRange {
    fn default() -> Self {
        Self::new(
            crate::config::MIN_THRUST_MAGNITUDE,
            crate::config::MAX_THRUST_MAGNITUDE,
        )
    }
}

/// A genome is a fixed-length sequence of thrust instructions, one per step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Genome {
    pub genes: Vec<Vec2>,
}

impl Genome {
    pub fn new(genes: Vec<Vec2>) -> Self {
        Self { genes }
    }

    /// Create a new random genome
    pub fn random<R: Rng>(length: usize, range: ThrustRange, rng: &mut R) -> Self {
        let genes = (0..length).map(|_| range.random_gene(rng)).collect();
        Self { genes }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Instruction for the given step, `None` once the genome is spent
    pub fn gene(&self, step: usize) -> Option<Vec2> {
        self.genes.get(step).copied()
    }

    /// Single-point crossover at a uniformly random split in `[0, len - 1]`
    pub fn crossover<R: Rng>(&self, other: &Genome, rng: &mut R) -> Self {
        if self.genes.is_empty() {
            return self.clone();
        }
        let point = rng.gen_range(0..self.genes.len());
        self.crossover_at(other, point)
    }

    /// Child takes `self[..point]` followed by `other[point..]`.
    ///
    /// The child always has `self`'s length; a short `other` is padded from
    /// `self` so the length invariant holds even for mismatched parents.
    pub fn crossover_at(&self, other: &Genome, point: usize) -> Self {
        let point = point.min(self.genes.len());
        let genes = (0..self.genes.len())
            .map(|i| {
                if i < point {
                    self.genes[i]
                } else {
                    other.genes.get(i).copied().unwrap_or(self.genes[i])
                }
            })
            .collect();
        Self { genes }
    }

    /// Create a mutated copy of this genome.
    /// Each gene is independently redrawn with probability `rate`.
    pub fn mutate<R: Rng>(&self, rate: f32, range: ThrustRange, rng: &mut R) -> Self {
        let genes = self
            .genes
            .iter()
            .map(|&gene| {
                if rng.gen_range(0.0..1.0) < rate {
                    range.random_gene(rng)
                } else {
                    gene
                }
            })
            .collect();
        Self { genes }
    }
}
