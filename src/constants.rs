use std::time::Duration;

use tracing::Level;

// Window defaults are in datagrams.
pub const DEFAULT_BASE_WINDOW: u32 = 4;
pub const DEFAULT_MIN_WINDOW: u32 = 3;
pub const DEFAULT_SLOW_START_MAX_WINDOW: u32 = 64;

// Never go below this during loss recovery, so that 1/window stays finite.
pub const MIN_RECOVERY_WINDOW: f64 = 1.;

pub const DEFAULT_ADDITIVE_GROWTH: f64 = 1.;
pub const DEFAULT_MULTIPLICATIVE_DECREASE: f64 = 0.5;

pub const DEFAULT_INITIAL_RTT_ESTIMATE: Duration = Duration::from_millis(200);
pub const DEFAULT_RTT_ESTIMATE_WEIGHT: f64 = 0.8;

pub const DEFAULT_EPOCH_DURATION: Duration = Duration::from_millis(10);

// profile[w] = alpha * profile[w] + (1 - alpha) * sample
pub const DEFAULT_PROFILE_ALPHA: f64 = 0.5;
// epoch_max = beta * epoch_max + (1 - beta) * max_sample
pub const DEFAULT_EPOCH_MAX_DELAY_BETA: f64 = 0.5;
pub const DEFAULT_PROFILE_SMOOTHING_THRESHOLD_MS: f64 = 10.;

pub const DEFAULT_TARGET_SMALL_STEP_MS: f64 = 1.;
pub const DEFAULT_TARGET_LARGE_STEP_MS: f64 = 2.;
pub const DEFAULT_CONGESTION_RATIO: f64 = 2.;

pub const DEFAULT_SLOW_START_DELAY_THRESHOLD: f64 = 2.;
pub const DEFAULT_LOSS_DELAY_MULTIPLIER: f64 = 4.;

pub const DEFAULT_MAX_WINDOW_INCREASE_PER_EPOCH: u32 = 2;
pub const DEFAULT_MAX_WINDOW_DECREASE_PER_EPOCH: u32 = 16;

pub const DEFAULT_TIMEOUT_MULTIPLIER: f64 = 3.;
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(1);
pub const MIN_TIMEOUT_MS: u64 = 10;
pub const MAX_TIMEOUT_MS: u64 = 10000;

// How many timeouts in a row without a fresh delay sample before the RTT
// estimate is doubled.
pub const TIMEOUTS_BEFORE_BACKOFF: u8 = 3;

// Acks that arrive "before" they were sent (clock skew, bogus input) are
// clamped to this.
pub const MIN_DELAY_SAMPLE_MS: f64 = 1.;

pub const DEFAULT_MAX_TRACKED_SEQUENCES: usize = 4096;

pub const CONGESTION_TRACING_LOG_LEVEL: Level = Level::DEBUG;
pub const CONGESTION_TRACING_LOG_EVERY_MS: u64 = 500;
