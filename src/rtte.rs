use std::time::Duration;

use tracing::trace;

use crate::{constants::TIMEOUTS_BEFORE_BACKOFF, utils::ewma};

// Upper bound the estimate can be pushed to by timeout backoff.
const RTTE_MAX_MS: f64 = 10000.;

/// Smoothed round-trip delay estimate.
///
/// `srtt = weight * srtt + (1 - weight) * sample`, starting from a configured
/// initial estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RttEstimator {
    srtt: f64,
    weight: f64,
    timeout_count: u8,
}

impl RttEstimator {
    pub fn new(initial: Duration, weight: f64) -> Self {
        Self {
            srtt: initial.as_secs_f64() * 1000.,
            weight,
            timeout_count: 0,
        }
    }

    /// Smoothed delay, milliseconds.
    pub fn srtt_ms(&self) -> f64 {
        self.srtt
    }

    pub fn sample(&mut self, delay_ms: f64) {
        self.srtt = ewma(self.srtt, delay_ms, self.weight);
        self.timeout_count = 0;
        trace!(sample = delay_ms, srtt = self.srtt, "rtte: sample");
    }

    pub fn on_timeout(&mut self) {
        self.timeout_count = self.timeout_count.saturating_add(1);
        if self.timeout_count >= TIMEOUTS_BEFORE_BACKOFF {
            // Without acks we can't sample, and if the real delay is above the estimate
            // every send would time out again. Force the estimate up.
            self.timeout_count = 0;
            self.srtt = RTTE_MAX_MS.min(self.srtt * 2.);
            trace!(srtt = self.srtt, "rtte: too many timeouts, increasing");
        }
    }
}
