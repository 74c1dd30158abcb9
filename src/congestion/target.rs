/// Steers the delay the controller aims for, one epoch at a time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayTargetEstimator {
    target: Option<f64>,
    small_step: f64,
    large_step: f64,
    congestion_ratio: f64,
}

impl DelayTargetEstimator {
    pub fn new(small_step_ms: f64, large_step_ms: f64, congestion_ratio: f64) -> Self {
        Self {
            target: None,
            small_step: small_step_ms,
            large_step: large_step_ms,
            congestion_ratio,
        }
    }

    pub fn target(&self) -> Option<f64> {
        self.target
    }

    pub fn reset(&mut self, min_delay_ms: f64) {
        self.target = Some(min_delay_ms);
    }

    pub fn set(&mut self, target_ms: f64, min_delay_ms: f64) {
        self.target = Some(target_ms.max(min_delay_ms));
    }

    /// Nudge the target from one epoch's max-delay signal. With no target yet,
    /// starts from `min_delay_ms`. The result is never below `min_delay_ms`.
    pub fn update(&mut self, prev_epoch_max_delay: f64, delta: f64, min_delay_ms: f64) -> f64 {
        let target = self.target.unwrap_or(min_delay_ms);

        let congested =
            min_delay_ms > 0. && prev_epoch_max_delay / min_delay_ms > self.congestion_ratio;

        let target = if congested {
            target - self.large_step
        } else if delta > 0. {
            target - self.small_step
        } else {
            target + self.large_step
        };

        let target = target.max(min_delay_ms);
        self.target = Some(target);
        target
    }
}
