use std::time::Duration;

/// Fixed-interval simulation pacer.
///
/// Nothing runs until `animation_rate` has accumulated; then every elapsed
/// `simulation_rate` becomes one step and the accumulator starts over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStep {
    pub animation_rate: Duration,
    pub simulation_rate: Duration,
    accumulated: Duration,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(Duration::from_millis(300), Duration::from_millis(30))
    }
}

impl FixedStep {
    pub fn new(animation_rate: Duration, simulation_rate: Duration) -> Self {
        Self {
            animation_rate,
            simulation_rate,
            accumulated: Duration::ZERO,
        }
    }

    /// Add `elapsed` and return how many simulation steps are due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        if self.accumulated < self.animation_rate {
            return 0;
        }
        let steps = if self.simulation_rate.is_zero() {
            1
        } else {
            (self.accumulated.as_nanos() / self.simulation_rate.as_nanos()) as u32
        };
        self.accumulated = Duration::ZERO;
        steps
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }

    pub fn pending(&self) -> Duration {
        self.accumulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_animation_rate() {
        let mut step = FixedStep::default();
        assert_eq!(step.advance(Duration::from_millis(100)), 0);
        assert_eq!(step.advance(Duration::from_millis(100)), 0);
        assert_eq!(step.pending(), Duration::from_millis(200));
        // 300ms accumulated -> ten 30ms steps
        assert_eq!(step.advance(Duration::from_millis(100)), 10);
        assert_eq!(step.pending(), Duration::ZERO);
    }

    #[test]
    fn long_frame_yields_many_steps() {
        let mut step = FixedStep::new(Duration::from_millis(16), Duration::from_millis(10));
        assert_eq!(step.advance(Duration::from_millis(95)), 9);
    }

    #[test]
    fn reset_clears_accumulator() {
        let mut step = FixedStep::default();
        step.advance(Duration::from_millis(250));
        step.reset();
        assert_eq!(step.advance(Duration::from_millis(100)), 0);
    }
}
