use std::time::{Duration, Instant};

/// Elapsed-time source read once per loop frame.
pub trait FrameClock {
    fn frame_delta(&mut self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    last: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for WallClock {
    fn frame_delta(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.saturating_duration_since(self.last);
        self.last = now;
        delta
    }
}

/// Reports exactly one step per frame; headless runs use it.
#[derive(Debug, Clone, Copy)]
pub struct FixedStepClock {
    step: Duration,
}

impl FixedStepClock {
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl FrameClock for FixedStepClock {
    fn frame_delta(&mut self) -> Duration {
        self.step
    }
}

/// Simulation time in seconds, advanced only in whole fixed steps.
///
/// Time is derived from the step count so long runs do not accumulate
/// rounding drift.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    step_seconds: f64,
    steps: u64,
}

impl SimClock {
    pub fn new(step: Duration) -> Self {
        Self {
            step_seconds: step.as_secs_f64(),
            steps: 0,
        }
    }

    pub fn step(&mut self) {
        self.steps = self.steps.saturating_add(1);
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn now(&self) -> f64 {
        self.steps as f64 * self.step_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_steps_at_sixty_hz_is_exactly_one_second() {
        let mut clock = SimClock::new(Duration::from_secs_f64(1.0 / 60.0));
        assert_eq!(clock.now(), 0.0);
        for _ in 0..60 {
            clock.step();
        }
        assert_eq!(clock.steps(), 60);
        assert!((clock.now() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ten_minutes_of_steps_do_not_drift() {
        let mut clock = SimClock::new(Duration::from_millis(16));
        for _ in 0..37_500 {
            clock.step();
        }
        assert!((clock.now() - 600.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_step_clock_repeats_its_step() {
        let mut clock = FixedStepClock::new(Duration::from_millis(16));
        assert_eq!(clock.frame_delta(), Duration::from_millis(16));
        assert_eq!(clock.frame_delta(), Duration::from_millis(16));
    }

    #[test]
    fn wall_clock_deltas_are_measured_between_reads() {
        let mut clock = WallClock::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.frame_delta() >= Duration::from_millis(5));
        assert!(clock.frame_delta() < Duration::from_millis(5));
    }
}
