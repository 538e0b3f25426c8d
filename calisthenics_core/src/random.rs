//! Injectable randomness for tie-breaking and shuffles.
//!
//! Selection code never reaches for a global RNG. Callers hand in a
//! `RandomSource`, which every `rand::Rng` already is, so tests can pass a
//! seeded `StdRng` and get reproducible workouts.

use rand::Rng;

/// A source of uniformly distributed floats in `[0, 1)`
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

impl<R: Rng> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Uniform index in `0..upper` (upper must be non-zero)
fn next_index(rng: &mut dyn RandomSource, upper: usize) -> usize {
    let idx = (rng.next_f64() * upper as f64) as usize;
    idx.min(upper - 1)
}

/// In-place Fisher-Yates shuffle
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = next_index(rng, i + 1);
        items.swap(i, j);
    }
}

/// Pick `count` items uniformly at random without replacement
pub fn choose_multiple<T: Clone>(items: &[T], count: usize, rng: &mut dyn RandomSource) -> Vec<T> {
    let mut pool = items.to_vec();
    shuffle(&mut pool, rng);
    pool.truncate(count);
    pool
}
