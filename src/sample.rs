use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SampleError {
    #[error("cannot pick {requested} items from an empty population")]
    InsufficientPopulation { requested: usize },
}

/// Random selection without replacement that only depends on the seed and the input.
///
/// Each call starts from a fresh generator seeded with the same value, so picking
/// prefixes, picking a trace target and picking report addresses don't influence each
/// other, and a repeated run with the same seed sees the same selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededSampler {
    seed: u64,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Picks `count` distinct elements, or all of them if there are fewer.
    /// Only an empty population with a non-zero `count` is an error.
    pub fn pick<T: Clone>(&self, population: &[T], count: usize) -> Result<Vec<T>, SampleError> {
        if population.is_empty() {
            return if count == 0 {
                Ok(vec![])
            } else {
                Err(SampleError::InsufficientPopulation { requested: count })
            };
        }
        let amount = count.min(population.len());
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(index::sample(&mut rng, population.len(), amount)
            .into_iter()
            .map(|idx| population[idx].clone())
            .collect())
    }

    pub fn pick_one<T: Clone>(&self, population: &[T]) -> Result<T, SampleError> {
        self.pick(population, 1)?
            .pop()
            .ok_or(SampleError::InsufficientPopulation { requested: 1 })
    }
}
