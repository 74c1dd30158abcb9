use std::time::{Duration, Instant};

use tracing::trace;

use crate::utils::ewma;

/// What an epoch boundary reduced the epoch's samples to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummary {
    /// The max-delay EWMA before this epoch was folded in.
    pub prev_max_delay: Option<f64>,
    /// The max-delay EWMA after this epoch was folded in.
    pub max_delay: Option<f64>,
    /// `max_delay - prev_max_delay`, 0 if either is unknown or the epoch was empty.
    pub delta: f64,
    pub samples: usize,
}

impl EpochSummary {
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }
}

/// Collects delay samples over fixed-duration epochs.
#[derive(Debug, Clone)]
pub struct EpochTracker {
    duration: Duration,
    started: Instant,
    samples: Vec<f64>,
    beta: f64,
    max_delay: Option<f64>,
    delta: f64,
}

impl EpochTracker {
    pub fn new(now: Instant, duration: Duration, beta: f64) -> Self {
        Self {
            duration,
            started: now,
            samples: Vec::new(),
            beta,
            max_delay: None,
            delta: 0.,
        }
    }

    pub fn observe(&mut self, delay_ms: f64) {
        self.samples.push(delay_ms);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) > self.duration
    }

    #[cfg(test)]
    pub fn max_delay(&self) -> Option<f64> {
        self.max_delay
    }

    #[cfg(test)]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    #[cfg(test)]
    pub fn pending_samples(&self) -> usize {
        self.samples.len()
    }

    /// Drop collected samples and start a fresh epoch at `now`.
    pub fn restart(&mut self, now: Instant) {
        self.samples.clear();
        self.started = now;
    }

    /// Drop collected samples without moving the epoch start.
    pub fn discard(&mut self) {
        self.samples.clear();
    }

    pub fn on_epoch_boundary(&mut self, now: Instant) -> EpochSummary {
        let samples = self.samples.len();
        let prev_max_delay = self.max_delay;

        let epoch_max = self.samples.iter().copied().reduce(f64::max);
        if let Some(epoch_max) = epoch_max {
            let max_delay = match prev_max_delay {
                Some(prev) => ewma(prev, epoch_max, self.beta),
                None => epoch_max,
            };
            self.delta = prev_max_delay.map(|prev| max_delay - prev).unwrap_or(0.);
            self.max_delay = Some(max_delay);
        } else {
            self.delta = 0.;
        }

        trace!(
            samples,
            epoch_max,
            max_delay = self.max_delay,
            delta = self.delta,
            "epoch boundary"
        );

        self.restart(now);

        EpochSummary {
            prev_max_delay,
            max_delay: self.max_delay,
            delta: self.delta,
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use approx::assert_abs_diff_eq;

    use super::EpochTracker;

    #[test]
    fn test_is_due() {
        let start = Instant::now();
        let e = EpochTracker::new(start, Duration::from_millis(10), 0.5);
        assert!(!e.is_due(start));
        assert!(!e.is_due(start + Duration::from_millis(10)));
        assert!(e.is_due(start + Duration::from_millis(11)));
    }

    #[test]
    fn test_first_epoch_seeds_ewma() {
        let start = Instant::now();
        let mut e = EpochTracker::new(start, Duration::from_millis(10), 0.5);
        e.observe(10.);
        e.observe(30.);
        e.observe(20.);

        let s = e.on_epoch_boundary(start + Duration::from_millis(11));
        assert_eq!(s.samples, 3);
        assert_eq!(s.prev_max_delay, None);
        assert_abs_diff_eq!(s.max_delay.unwrap(), 30.);
        assert_abs_diff_eq!(s.delta, 0.);
        assert_eq!(e.pending_samples(), 0);
    }

    #[test]
    fn test_ewma_and_delta() {
        let start = Instant::now();
        let mut e = EpochTracker::new(start, Duration::from_millis(10), 0.5);
        e.observe(30.);
        e.on_epoch_boundary(start);

        e.observe(50.);
        let s = e.on_epoch_boundary(start);
        assert_abs_diff_eq!(s.prev_max_delay.unwrap(), 30.);
        assert_abs_diff_eq!(s.max_delay.unwrap(), 40.);
        assert_abs_diff_eq!(s.delta, 10.);

        e.observe(20.);
        let s = e.on_epoch_boundary(start);
        assert_abs_diff_eq!(s.max_delay.unwrap(), 30.);
        assert_abs_diff_eq!(s.delta, -10.);
    }

    #[test]
    fn test_empty_epoch_leaves_ewma() {
        let start = Instant::now();
        let mut e = EpochTracker::new(start, Duration::from_millis(10), 0.5);
        e.observe(30.);
        e.on_epoch_boundary(start);
        e.observe(50.);
        e.on_epoch_boundary(start);

        let s = e.on_epoch_boundary(start);
        assert!(s.is_empty());
        assert_abs_diff_eq!(s.max_delay.unwrap(), 40.);
        assert_abs_diff_eq!(s.delta, 0.);
        assert_abs_diff_eq!(e.delta(), 0.);
    }

    #[test]
    fn test_restart_and_discard() {
        let start = Instant::now();
        let mut e = EpochTracker::new(start, Duration::from_millis(10), 0.5);
        e.observe(1.);
        e.discard();
        assert_eq!(e.pending_samples(), 0);
        assert!(e.is_due(start + Duration::from_millis(20)));

        e.observe(1.);
        e.restart(start + Duration::from_millis(20));
        assert_eq!(e.pending_samples(), 0);
        assert!(!e.is_due(start + Duration::from_millis(25)));
        assert_eq!(e.max_delay(), None);
    }
}
