//! Macro-step clock for the simulation driver.
//!
//! Continuous time, fixed step width. The clock knows nothing about events;
//! it only answers "where does the current macro step end" and "where is
//! its midpoint", the two observation instants of each step.

/// Walks `[origin, ..)` in macro steps of width `dt`.
///
/// # Example
/// ```
/// use multiscale_simulator_core_rs::StepClock;
///
/// let mut clock = StepClock::new(0.0, 0.5);
/// assert_eq!(clock.now(), 0.0);
/// assert_eq!(clock.next_boundary(10.0), 0.5);
/// assert_eq!(clock.mid(10.0), 0.25);
///
/// clock.advance_to(0.5);
/// assert_eq!(clock.steps_taken(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StepClock {
    /// Start of the run.
    origin: f64,
    /// Macro-step width.
    dt: f64,
    /// Current time (start of the next step).
    now: f64,
    /// Completed macro steps.
    steps: usize,
}

impl StepClock {
    /// Create a clock at `origin` with step width `dt`.
    ///
    /// # Panics
    /// Panics unless `dt` is finite and positive.
    pub fn new(origin: f64, dt: f64) -> Self {
        assert!(dt.is_finite() && dt > 0.0, "dt must be finite and positive");
        Self {
            origin,
            dt,
            now: origin,
            steps: 0,
        }
    }

    /// Current time.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Start of the run.
    pub fn origin(&self) -> f64 {
        self.origin
    }

    /// Macro-step width.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Completed macro steps.
    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// End of the current macro step, clipped to `to` for the final,
    /// possibly shorter step.
    pub fn next_boundary(&self, to: f64) -> f64 {
        (self.now + self.dt).min(to)
    }

    /// Midpoint of the current macro step (mid-term observation instant).
    pub fn mid(&self, to: f64) -> f64 {
        self.now + (self.next_boundary(to) - self.now) / 2.0
    }

    /// True once the clock has reached or passed `to`.
    pub fn is_done(&self, to: f64) -> bool {
        self.now >= to
    }

    /// Complete the current step by jumping to its boundary.
    pub fn advance_to(&mut self, boundary: f64) {
        debug_assert!(boundary >= self.now, "clock may not move backwards");
        self.now = boundary;
        self.steps += 1;
    }
}
