use crate::config::NetworkProfile;
use alloy::primitives::U256;
use rand::Rng;

/// Number of discrete steps the `[min, max]` range is divided into.
pub const SIZE_STEPS: u32 = 1_000;

/// Bounded pseudo-random request magnitude for one network, in base units.
///
/// `step` is drawn uniformly from `0..SIZE_STEPS`; the magnitude is
/// `min + (max - min) * step / SIZE_STEPS`, so step 0 yields exactly `min` and the result
/// never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeGenerator {
    min: U256,
    max: U256,
}

impl SizeGenerator {
    /// Bounds are already scaled to base units. Inverted bounds are swapped.
    pub fn new(min: U256, max: U256) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn for_profile(profile: &NetworkProfile) -> Self {
        Self::new(profile.size_min, profile.size_max)
    }

    pub fn min(&self) -> U256 {
        self.min
    }

    pub fn max(&self) -> U256 {
        self.max
    }

    pub fn size_at_step(&self, step: u32) -> U256 {
        let step = step.min(SIZE_STEPS - 1);
        let span = self.max - self.min;
        let steps = U256::from(SIZE_STEPS);
        // Spans near U256::MAX: divide first so the product fits.
        let offset = span
            .checked_mul(U256::from(step))
            .map(|scaled| scaled / steps)
            .unwrap_or_else(|| span / steps * U256::from(step));
        self.min + offset
    }

    pub fn size<R: Rng + ?Sized>(&self, rng: &mut R) -> U256 {
        self.size_at_step(rng.gen_range(0..SIZE_STEPS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::utils::parse_units;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn eth(raw: &str) -> U256 {
        parse_units(raw, 18).unwrap().get_absolute()
    }

    #[test]
    fn test_extremes_of_random_source_stay_in_bounds() {
        let gen = SizeGenerator::new(eth("0.01"), eth("0.05"));
        assert_eq!(gen.size_at_step(0), eth("0.01"));
        let top = gen.size_at_step(SIZE_STEPS - 1);
        assert_eq!(top, eth("0.04996"));
        assert!(top <= gen.max());
        // Out-of-range steps are clamped rather than overshooting `max`.
        assert_eq!(gen.size_at_step(u32::MAX), top);
    }

    #[test]
    fn test_random_sizes_fall_within_scaled_bounds() {
        let gen = SizeGenerator::new(eth("50"), eth("200"));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let size = gen.size(&mut rng);
            assert!(size >= gen.min() && size <= gen.max(), "{size} escaped bounds");
        }
    }

    #[test]
    fn test_steps_are_thousandths_of_the_range() {
        let gen = SizeGenerator::new(U256::from(1_000u64), U256::from(3_000u64));
        assert_eq!(gen.size_at_step(1), U256::from(1_002u64));
        assert_eq!(gen.size_at_step(500), U256::from(2_000u64));
        assert_eq!(gen.size_at_step(999), U256::from(2_998u64));
    }

    #[test]
    fn test_equal_and_inverted_bounds() {
        let fixed = SizeGenerator::new(U256::from(5u64), U256::from(5u64));
        assert_eq!(fixed.size_at_step(999), U256::from(5u64));
        let swapped = SizeGenerator::new(U256::from(9u64), U256::from(3u64));
        assert_eq!(swapped.min(), U256::from(3u64));
        assert_eq!(swapped.max(), U256::from(9u64));
    }

    #[test]
    fn test_huge_span_does_not_wrap() {
        let gen = SizeGenerator::new(U256::from(1u64), U256::MAX);
        assert_eq!(gen.size_at_step(0), U256::from(1u64));
        let mut previous = gen.size_at_step(0);
        for step in (1..SIZE_STEPS).step_by(37).chain([SIZE_STEPS - 1]) {
            let size = gen.size_at_step(step);
            assert!(size >= previous, "step {step} went backwards");
            assert!(size <= gen.max());
            previous = size;
        }
        let half = gen.size_at_step(SIZE_STEPS / 2);
        let quarter = U256::MAX / U256::from(4u64);
        assert!(half > quarter && half < quarter * U256::from(3u64));
    }
}
