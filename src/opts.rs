use std::time::Duration;

use crate::{
    Error, Result,
    congestion::{CongestionController, tracing::TracingController},
    constants::{
        DEFAULT_ADDITIVE_GROWTH, DEFAULT_BASE_WINDOW, DEFAULT_CONGESTION_RATIO,
        DEFAULT_EPOCH_DURATION, DEFAULT_EPOCH_MAX_DELAY_BETA, DEFAULT_FALLBACK_TIMEOUT,
        DEFAULT_INITIAL_RTT_ESTIMATE, DEFAULT_LOSS_DELAY_MULTIPLIER,
        DEFAULT_MAX_TRACKED_SEQUENCES, DEFAULT_MAX_WINDOW_DECREASE_PER_EPOCH,
        DEFAULT_MAX_WINDOW_INCREASE_PER_EPOCH, DEFAULT_MIN_WINDOW,
        DEFAULT_MULTIPLICATIVE_DECREASE, DEFAULT_PROFILE_ALPHA,
        DEFAULT_PROFILE_SMOOTHING_THRESHOLD_MS, DEFAULT_RTT_ESTIMATE_WEIGHT,
        DEFAULT_SLOW_START_DELAY_THRESHOLD, DEFAULT_SLOW_START_MAX_WINDOW,
        DEFAULT_TARGET_LARGE_STEP_MS, DEFAULT_TARGET_SMALL_STEP_MS, DEFAULT_TIMEOUT_MULTIPLIER,
    },
    controller::Controller,
    traits::Environment,
};

/// Which window-sizing algorithm the controller runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    /// Constant window of `base_window` datagrams.
    Fixed,
    /// Slow start, then additive increase / multiplicative decrease on loss.
    Aimd,
    /// Delay-profile driven window selection with delay-triggered backoff.
    #[default]
    DelayTriggered,
}

/// Controller options. Everything left as None gets a sensible default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControllerOpts {
    pub kind: ControllerKind,

    /// Log every state change of the controller.
    pub tracing: bool,

    /// Initial window, and the only window for [ControllerKind::Fixed]. Raised to
    /// `min_window` if below it.
    pub base_window: Option<u32>,
    /// Lowest window outside of loss recovery.
    pub min_window: Option<u32>,
    /// Hard cap on the window. Unbounded by default.
    pub max_window: Option<u32>,
    /// Slow start ends once the window reaches this.
    pub slow_start_max_window: Option<u32>,
    /// Slow start ends once an ack's delay exceeds this multiple of the minimum delay.
    pub slow_start_delay_threshold: Option<f64>,

    /// Datagrams added per window's worth of acks in AIMD steady state.
    pub additive_growth: Option<f64>,
    /// Factor the window is multiplied by when entering loss recovery.
    pub multiplicative_decrease: Option<f64>,

    pub initial_rtt_estimate: Option<Duration>,
    /// Weight of the old value in the RTT estimate EWMA.
    pub rtt_estimate_weight: Option<f64>,

    pub epoch_duration: Option<Duration>,
    /// Weight of the old value in the delay profile EWMA.
    pub profile_alpha: Option<f64>,
    /// Weight of the old value in the per-epoch max delay EWMA.
    pub epoch_max_delay_beta: Option<f64>,
    /// Neighbouring profile entries are clamped to within this many milliseconds.
    pub profile_smoothing_threshold_ms: Option<f64>,

    pub target_small_step_ms: Option<f64>,
    pub target_large_step_ms: Option<f64>,
    /// When epoch max delay exceeds this multiple of the minimum delay, back off hard.
    pub congestion_ratio: Option<f64>,

    pub max_window_increase_per_epoch: Option<u32>,
    pub max_window_decrease_per_epoch: Option<u32>,

    /// An ack delayed by more than this multiple of the delay estimate is treated as loss.
    pub loss_delay_multiplier: Option<f64>,
    pub timeout_multiplier: Option<f64>,
    /// Timeout used by [ControllerKind::Fixed].
    pub fallback_timeout: Option<Duration>,

    /// How many outstanding datagrams to remember send-time windows for.
    pub max_tracked_sequences: Option<usize>,
}

fn nonzero(name: &'static str, value: u32) -> Result<u32> {
    if value == 0 {
        return Err(Error::ZeroValue { name });
    }
    Ok(value)
}

fn positive(name: &'static str, value: f64) -> Result<f64> {
    if !(value > 0. && value.is_finite()) {
        return Err(Error::OutOfRange {
            name,
            value,
            range: "(0, inf)",
        });
    }
    Ok(value)
}

// EWMA weights: 1 would never move.
fn weight(name: &'static str, value: f64) -> Result<f64> {
    if !(0. ..1.).contains(&value) {
        return Err(Error::OutOfRange {
            name,
            value,
            range: "[0, 1)",
        });
    }
    Ok(value)
}

fn factor(name: &'static str, value: f64) -> Result<f64> {
    if !(value > 0. && value <= 1.) {
        return Err(Error::OutOfRange {
            name,
            value,
            range: "(0, 1]",
        });
    }
    Ok(value)
}

impl ControllerOpts {
    pub(crate) fn validate(&self) -> Result<ValidatedOpts> {
        let min_window = nonzero("min_window", self.min_window.unwrap_or(DEFAULT_MIN_WINDOW))?;
        let max_window = self
            .max_window
            .map(|w| nonzero("max_window", w))
            .transpose()?;
        if let Some(max_window) = max_window {
            if min_window > max_window {
                return Err(Error::MinWindowAboveMax {
                    min_window,
                    max_window,
                });
            }
        }
        let cap = |w: u32| max_window.map_or(w, |max| w.min(max));

        let base_window = cap(nonzero(
            "base_window",
            self.base_window.unwrap_or(DEFAULT_BASE_WINDOW),
        )?)
        .max(min_window);
        let slow_start_max_window = cap(nonzero(
            "slow_start_max_window",
            self.slow_start_max_window
                .unwrap_or(DEFAULT_SLOW_START_MAX_WINDOW),
        )?);

        let max_window_increase_per_epoch = nonzero(
            "max_window_increase_per_epoch",
            self.max_window_increase_per_epoch
                .unwrap_or(DEFAULT_MAX_WINDOW_INCREASE_PER_EPOCH),
        )?;
        let max_window_decrease_per_epoch = nonzero(
            "max_window_decrease_per_epoch",
            self.max_window_decrease_per_epoch
                .unwrap_or(DEFAULT_MAX_WINDOW_DECREASE_PER_EPOCH),
        )?;
        if max_window_decrease_per_epoch < max_window_increase_per_epoch {
            return Err(Error::DecreaseSlowerThanIncrease {
                increase: max_window_increase_per_epoch,
                decrease: max_window_decrease_per_epoch,
            });
        }

        let epoch_duration = self.epoch_duration.unwrap_or(DEFAULT_EPOCH_DURATION);
        if epoch_duration.is_zero() {
            return Err(Error::ZeroValue {
                name: "epoch_duration",
            });
        }

        let fallback_timeout = self.fallback_timeout.unwrap_or(DEFAULT_FALLBACK_TIMEOUT);
        if fallback_timeout.is_zero() {
            return Err(Error::ZeroValue {
                name: "fallback_timeout",
            });
        }

        let max_tracked_sequences = self
            .max_tracked_sequences
            .unwrap_or(DEFAULT_MAX_TRACKED_SEQUENCES);
        if max_tracked_sequences == 0 {
            return Err(Error::ZeroValue {
                name: "max_tracked_sequences",
            });
        }

        Ok(ValidatedOpts {
            kind: self.kind,
            base_window,
            min_window,
            max_window,
            slow_start_max_window,
            slow_start_delay_threshold: positive(
                "slow_start_delay_threshold",
                self.slow_start_delay_threshold
                    .unwrap_or(DEFAULT_SLOW_START_DELAY_THRESHOLD),
            )?,
            additive_growth: positive(
                "additive_growth",
                self.additive_growth.unwrap_or(DEFAULT_ADDITIVE_GROWTH),
            )?,
            multiplicative_decrease: factor(
                "multiplicative_decrease",
                self.multiplicative_decrease
                    .unwrap_or(DEFAULT_MULTIPLICATIVE_DECREASE),
            )?,
            initial_rtt_estimate: self
                .initial_rtt_estimate
                .unwrap_or(DEFAULT_INITIAL_RTT_ESTIMATE),
            rtt_estimate_weight: weight(
                "rtt_estimate_weight",
                self.rtt_estimate_weight
                    .unwrap_or(DEFAULT_RTT_ESTIMATE_WEIGHT),
            )?,
            epoch_duration,
            profile_alpha: weight(
                "profile_alpha",
                self.profile_alpha.unwrap_or(DEFAULT_PROFILE_ALPHA),
            )?,
            epoch_max_delay_beta: weight(
                "epoch_max_delay_beta",
                self.epoch_max_delay_beta
                    .unwrap_or(DEFAULT_EPOCH_MAX_DELAY_BETA),
            )?,
            profile_smoothing_threshold_ms: positive(
                "profile_smoothing_threshold_ms",
                self.profile_smoothing_threshold_ms
                    .unwrap_or(DEFAULT_PROFILE_SMOOTHING_THRESHOLD_MS),
            )?,
            target_small_step_ms: positive(
                "target_small_step_ms",
                self.target_small_step_ms
                    .unwrap_or(DEFAULT_TARGET_SMALL_STEP_MS),
            )?,
            target_large_step_ms: positive(
                "target_large_step_ms",
                self.target_large_step_ms
                    .unwrap_or(DEFAULT_TARGET_LARGE_STEP_MS),
            )?,
            congestion_ratio: positive(
                "congestion_ratio",
                self.congestion_ratio.unwrap_or(DEFAULT_CONGESTION_RATIO),
            )?,
            max_window_increase_per_epoch,
            max_window_decrease_per_epoch,
            loss_delay_multiplier: positive(
                "loss_delay_multiplier",
                self.loss_delay_multiplier
                    .unwrap_or(DEFAULT_LOSS_DELAY_MULTIPLIER),
            )?,
            timeout_multiplier: positive(
                "timeout_multiplier",
                self.timeout_multiplier
                    .unwrap_or(DEFAULT_TIMEOUT_MULTIPLIER),
            )?,
            fallback_timeout,
            max_tracked_sequences,
        })
    }

    /// Build a controller driven by `env`'s clock.
    pub fn create<E: Environment>(&self, env: E) -> Result<Box<dyn CongestionController>> {
        let controller = Controller::new(env, *self)?;
        if self.tracing {
            tracing::debug!("enabling congestion tracing");
            return Ok(Box::new(TracingController::new(controller)));
        }
        Ok(Box::new(controller))
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidatedOpts {
    pub kind: ControllerKind,
    pub base_window: u32,
    pub min_window: u32,
    pub max_window: Option<u32>,
    pub slow_start_max_window: u32,
    pub slow_start_delay_threshold: f64,
    pub additive_growth: f64,
    pub multiplicative_decrease: f64,
    pub initial_rtt_estimate: Duration,
    pub rtt_estimate_weight: f64,
    pub epoch_duration: Duration,
    pub profile_alpha: f64,
    pub epoch_max_delay_beta: f64,
    pub profile_smoothing_threshold_ms: f64,
    pub target_small_step_ms: f64,
    pub target_large_step_ms: f64,
    pub congestion_ratio: f64,
    pub max_window_increase_per_epoch: u32,
    pub max_window_decrease_per_epoch: u32,
    pub loss_delay_multiplier: f64,
    pub timeout_multiplier: f64,
    pub fallback_timeout: Duration,
    pub max_tracked_sequences: usize,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ControllerKind, ControllerOpts};
    use crate::{Error, test_util::env::MockEnvironment};

    #[test]
    fn test_defaults_validate() {
        let v = ControllerOpts::default().validate().unwrap();
        assert_eq!(v.kind, ControllerKind::DelayTriggered);
        assert_eq!(v.base_window, 4);
        assert_eq!(v.min_window, 3);
        assert_eq!(v.max_window, None);
        assert_eq!(v.epoch_duration, Duration::from_millis(10));
        assert_eq!(v.initial_rtt_estimate, Duration::from_millis(200));
    }

    #[test]
    fn test_windows_capped_by_max() {
        let v = ControllerOpts {
            base_window: Some(100),
            max_window: Some(20),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(v.base_window, 20);
        assert_eq!(v.slow_start_max_window, 20);
    }

    #[test]
    fn test_base_window_raised_to_min() {
        let v = ControllerOpts {
            kind: ControllerKind::Fixed,
            base_window: Some(1),
            min_window: Some(3),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(v.base_window, 3);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = |opts: ControllerOpts| opts.validate().unwrap_err();

        assert_eq!(
            err(ControllerOpts {
                min_window: Some(0),
                ..Default::default()
            }),
            Error::ZeroValue { name: "min_window" }
        );
        assert_eq!(
            err(ControllerOpts {
                min_window: Some(10),
                max_window: Some(5),
                ..Default::default()
            }),
            Error::MinWindowAboveMax {
                min_window: 10,
                max_window: 5
            }
        );
        assert_eq!(
            err(ControllerOpts {
                max_window_increase_per_epoch: Some(8),
                max_window_decrease_per_epoch: Some(4),
                ..Default::default()
            }),
            Error::DecreaseSlowerThanIncrease {
                increase: 8,
                decrease: 4
            }
        );
        assert!(matches!(
            err(ControllerOpts {
                multiplicative_decrease: Some(1.5),
                ..Default::default()
            }),
            Error::OutOfRange {
                name: "multiplicative_decrease",
                ..
            }
        ));
        assert!(matches!(
            err(ControllerOpts {
                profile_alpha: Some(1.),
                ..Default::default()
            }),
            Error::OutOfRange {
                name: "profile_alpha",
                ..
            }
        ));
        assert!(matches!(
            err(ControllerOpts {
                timeout_multiplier: Some(f64::NAN),
                ..Default::default()
            }),
            Error::OutOfRange {
                name: "timeout_multiplier",
                ..
            }
        ));
        assert_eq!(
            err(ControllerOpts {
                epoch_duration: Some(Duration::ZERO),
                ..Default::default()
            }),
            Error::ZeroValue {
                name: "epoch_duration"
            }
        );
    }

    #[test]
    fn test_create() {
        let env = MockEnvironment::new();
        for kind in [
            ControllerKind::Fixed,
            ControllerKind::Aimd,
            ControllerKind::DelayTriggered,
        ] {
            for tracing in [false, true] {
                let mut cc = ControllerOpts {
                    kind,
                    tracing,
                    base_window: Some(10),
                    ..Default::default()
                }
                .create(env.clone())
                .unwrap();
                assert_eq!(cc.window_size(), 10);
            }
        }

        assert!(
            ControllerOpts {
                base_window: Some(0),
                ..Default::default()
            }
            .create(env)
            .is_err()
        );
    }
}
