use rand::{rngs::StdRng, thread_rng, Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A fresh seed in the same shape browsers send (a millisecond timestamp
/// style digit string).
pub fn generate_seed() -> String {
    thread_rng().gen_range(1_000_000_000_000u64..10_000_000_000_000u64).to_string()
}

/// Numeric seeds are used as-is; anything else is hashed.
pub fn rng_from_seed(seed: &str) -> StdRng {
    let value = seed.trim().parse::<u64>().unwrap_or_else(|_| {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        hasher.finish()
    });
    StdRng::seed_from_u64(value)
}
