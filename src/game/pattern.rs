//! Sources of lamp patterns for each new round.

use crate::indicator::IndicatorMask;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Produces the lamps to light for the next round.
pub trait PatternSource: Send {
    /// Next pattern. Any of the eight masks, including the empty one.
    fn next_pattern(&mut self) -> IndicatorMask;
}

/// Uniformly random patterns drawn from an RNG.
#[derive(Debug, Clone)]
pub struct RandomPattern<R> {
    rng: R,
}

impl<R: RngCore + Send> RandomPattern<R> {
    /// Draw patterns from `rng`.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomPattern<StdRng> {
    /// Patterns from a generator seeded by the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible patterns.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore + Send> PatternSource for RandomPattern<R> {
    fn next_pattern(&mut self) -> IndicatorMask {
        IndicatorMask::from_bits_truncate(self.rng.gen::<u8>() & IndicatorMask::all().bits())
    }
}

/// Replays a fixed list of patterns, then repeats the last one.
#[derive(Debug, Clone)]
pub struct ScriptedPattern {
    script: Vec<IndicatorMask>,
    position: usize,
}

impl ScriptedPattern {
    /// Replay `script`; an empty script always yields the empty mask.
    pub fn new(script: impl Into<Vec<IndicatorMask>>) -> Self {
        Self {
            script: script.into(),
            position: 0,
        }
    }

    /// Always yield `mask`.
    pub fn constant(mask: IndicatorMask) -> Self {
        Self::new(vec![mask])
    }
}

impl PatternSource for ScriptedPattern {
    fn next_pattern(&mut self) -> IndicatorMask {
        let Some(last) = self.script.len().checked_sub(1) else {
            return IndicatorMask::empty();
        };
        let mask = self.script[self.position.min(last)];
        self.position += 1;
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_covers_all_masks() {
        let mut source = RandomPattern::seeded(7);
        let mut seen = [false; 8];
        for _ in 0..1000 {
            seen[usize::from(source.next_pattern().bits())] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = RandomPattern::seeded(42);
        let mut b = RandomPattern::seeded(42);
        for _ in 0..32 {
            assert_eq!(a.next_pattern(), b.next_pattern());
        }
    }

    #[test]
    fn test_script_repeats_last() {
        let mut source = ScriptedPattern::new([IndicatorMask::all(), IndicatorMask::NUM_LOCK]);
        assert_eq!(source.next_pattern(), IndicatorMask::all());
        assert_eq!(source.next_pattern(), IndicatorMask::NUM_LOCK);
        assert_eq!(source.next_pattern(), IndicatorMask::NUM_LOCK);

        let mut empty = ScriptedPattern::new(Vec::new());
        assert_eq!(empty.next_pattern(), IndicatorMask::empty());
    }
}
