//! Wall-clock time steps.

use std::time::Instant;


/// Measures the wall-clock time between steps.
#[derive(Debug, Clone)]
pub struct StepClock {
    prev: Instant,
    max_dt: Option<f64>,
}

impl StepClock {
    /// Start measuring from now. Steps longer than `max_dt` seconds are clamped to it.
    pub fn new(max_dt: Option<f64>) -> Self {
        StepClock {
            prev: Instant::now(),
            max_dt,
        }
    }

    /// Seconds elapsed between the previous step and `now`, clamped to `max_dt`.
    pub fn dt(&self, now: Instant) -> f64 {
        let dt = now.saturating_duration_since(self.prev).as_secs_f64();
        match self.max_dt {
            Some(max_dt) if dt > max_dt => {
                warn!(dt, max_dt, "step took too long, clamping time step");
                max_dt
            }
            _ => dt,
        }
    }

    /// Record `now` as the time of the previous step.
    pub fn mark(&mut self, now: Instant) {
        self.prev = now;
    }
}


#[test]
fn clamps_long_steps() {
    use std::time::Duration;

    let mut clock = StepClock::new(Some(0.25));
    let t0 = Instant::now();
    clock.mark(t0);
    assert_eq!(clock.dt(t0 + Duration::from_millis(100)), 0.1);
    assert_eq!(clock.dt(t0 + Duration::from_secs(3)), 0.25);
    // earlier than the mark saturates to zero
    assert_eq!(clock.dt(t0), 0.0);

    let unclamped = StepClock { prev: t0, max_dt: None };
    assert_eq!(unclamped.dt(t0 + Duration::from_secs(3)), 3.0);
}
