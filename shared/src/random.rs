use rand::Rng;

/// Source of uniform draws in `[0, 1)` used by the selector and the animator.
pub trait UniformSource {
    fn next_unit(&mut self) -> f64;
}

/// Adapter over any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> UniformSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted.
///
/// Values are clamped into `[0, 1)` so a test can never push the selector or
/// the jitter outside their documented ranges.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Always returns the same draw.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl UniformSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0 - f64::EPSILON)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sequence_cycles() {
        let mut source = SequenceSource::new(vec![0.1, 0.2]);
        assert_eq!(source.next_unit(), 0.1);
        assert_eq!(source.next_unit(), 0.2);
        assert_eq!(source.next_unit(), 0.1);
    }

    #[test]
    fn test_sequence_clamps_out_of_range() {
        let mut source = SequenceSource::new(vec![1.0, -3.0]);
        assert!(source.next_unit() < 1.0);
        assert_eq!(source.next_unit(), 0.0);
    }

    #[test]
    fn test_rng_source_stays_in_unit_interval() {
        let mut source = RngSource::new(StdRng::seed_from_u64(7));
        for _ in 0..1000 {
            let value = source.next_unit();
            assert!((0.0..1.0).contains(&value));
        }
    }
}
