//! Seeds and deterministic shuffling
//!
//! The generator is a plain linear congruential generator so that a seed
//! printed by one run reproduces the same test order in another.

/// Largest seed a user can pass
pub const MAX_RANDOM_SEED: u32 = 99999;

/// Linear congruential generator with a 2^31 modulus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Random {
    state: u32,
}

impl Random {
    /// Exclusive upper bound of `generate`'s range argument
    pub const MAX_RANGE: u32 = 1 << 31;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn reseed(&mut self, seed: u32) {
        self.state = seed;
    }

    /// Next value in `[0, range)`
    ///
    /// `range` is clamped to `[1, MAX_RANGE]`.
    pub fn generate(&mut self, range: u32) -> u32 {
        let range = range.clamp(1, Self::MAX_RANGE);
        self.state = self
            .state
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345)
            % Self::MAX_RANGE;
        self.state % range
    }
}

/// Map a seed option to a seed in `[1, MAX_RANDOM_SEED]`
///
/// A zero option derives the seed from `now_ms`.
pub fn normalize_seed(seed_option: u32, now_ms: u64) -> u32 {
    let raw = if seed_option == 0 {
        now_ms as u32
    } else {
        seed_option
    };
    raw.wrapping_sub(1) % MAX_RANDOM_SEED + 1
}

/// Seed used by the iteration after one run with `seed`
pub fn next_random_seed(seed: u32) -> u32 {
    if seed >= MAX_RANDOM_SEED {
        1
    } else {
        seed + 1
    }
}

/// Fisher-Yates shuffle of `v[begin..end]`
///
/// Out-of-bounds ranges are clamped to the slice.
pub fn shuffle_range<T>(random: &mut Random, begin: usize, end: usize, v: &mut [T]) {
    let end = end.min(v.len());
    let begin = begin.min(end);

    let mut width = end - begin;
    while width >= 2 {
        let last = begin + width - 1;
        let selected = begin + random.generate(width as u32) as usize;
        v.swap(selected, last);
        width -= 1;
    }
}

/// Fisher-Yates shuffle of the whole slice
pub fn shuffle<T>(random: &mut Random, v: &mut [T]) {
    let len = v.len();
    shuffle_range(random, 0, len, v);
}
