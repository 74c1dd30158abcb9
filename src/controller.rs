use tracing::{debug, trace};

use crate::{
    Result,
    congestion::{
        CongestionController, ControllerState, Phase, delay_profile::DelayProfile,
        epoch::EpochTracker, selector::WindowSelector, seq_window::SequenceWindowMap,
        target::DelayTargetEstimator,
    },
    constants::{MAX_TIMEOUT_MS, MIN_DELAY_SAMPLE_MS, MIN_RECOVERY_WINDOW, MIN_TIMEOUT_MS},
    metrics::METRICS,
    opts::{ControllerKind, ControllerOpts, ValidatedOpts},
    rtte::RttEstimator,
    seq_nr::SeqNr,
    traits::{DefaultEnvironment, Environment},
};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LossCause {
    Gap,
    Delay,
    Timeout,
}

/// Window controller state machine.
///
/// Starts in slow start (except [ControllerKind::Fixed], which is always in
/// steady state), moves to steady state once delay climbs or the slow start
/// ceiling is hit, and drops into loss recovery when an ack isn't the next
/// sequence number, on timeouts, or (delay-triggered only) on excessive delay.
///
/// The delay profile and epochs only run in steady state.
pub struct Controller<E = DefaultEnvironment> {
    env: E,
    opts: ValidatedOpts,

    phase: Phase,
    // Datagrams. Never below MIN_RECOVERY_WINDOW, and never below
    // opts.min_window outside of loss recovery.
    window: f64,
    min_delay: Option<f64>,
    highest_acked: Option<SeqNr>,

    rtte: RttEstimator,
    epoch: EpochTracker,
    profile: DelayProfile,
    target: DelayTargetEstimator,
    selector: WindowSelector,
    sent_windows: SequenceWindowMap,
}

impl<E> core::fmt::Debug for Controller<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "kind={:?},phase={:?},window={:.2},target={:?},min_delay={:?}",
            self.opts.kind,
            self.phase,
            self.window,
            self.target.target(),
            self.min_delay
        )
    }
}

impl<E: Environment> Controller<E> {
    pub fn new(env: E, opts: ControllerOpts) -> Result<Self> {
        let opts = opts.validate()?;
        let now = env.now();

        let phase = match opts.kind {
            ControllerKind::Fixed => Phase::SteadyState,
            ControllerKind::Aimd | ControllerKind::DelayTriggered => Phase::SlowStart,
        };

        Ok(Self {
            phase,
            window: opts.base_window as f64,
            min_delay: None,
            highest_acked: None,
            rtte: RttEstimator::new(opts.initial_rtt_estimate, opts.rtt_estimate_weight),
            epoch: EpochTracker::new(now, opts.epoch_duration, opts.epoch_max_delay_beta),
            profile: DelayProfile::new(opts.profile_alpha, opts.profile_smoothing_threshold_ms),
            target: DelayTargetEstimator::new(
                opts.target_small_step_ms,
                opts.target_large_step_ms,
                opts.congestion_ratio,
            ),
            selector: WindowSelector::new(
                opts.min_window,
                opts.max_window,
                opts.max_window_increase_per_epoch,
                opts.max_window_decrease_per_epoch,
            ),
            sent_windows: SequenceWindowMap::new(opts.max_tracked_sequences),
            env,
            opts,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub(crate) fn profile(&self) -> &DelayProfile {
        &self.profile
    }

    #[cfg(test)]
    pub(crate) fn epoch(&self) -> &EpochTracker {
        &self.epoch
    }

    fn current_window(&self) -> u32 {
        (self.window as u32).max(1)
    }

    fn is_delay_triggered(&self) -> bool {
        self.opts.kind == ControllerKind::DelayTriggered
    }

    // What "the current delay" is for timeouts and delay-triggered loss.
    fn delay_estimate(&self) -> f64 {
        match self.target.target() {
            Some(target) if self.is_delay_triggered() => target,
            _ => self.rtte.srtt_ms(),
        }
    }

    fn record_profile(&mut self, sent_window: Option<u32>, delay: f64) {
        if !self.is_delay_triggered() {
            return;
        }
        if let Some(w) = sent_window {
            self.profile.record(w, delay);
        }
    }

    fn on_epoch_boundary(&mut self) {
        let now = self.env.now();
        let summary = self.epoch.on_epoch_boundary(now);
        METRICS.epochs_processed.increment(1);
        if summary.is_empty() {
            // Nothing was acked, nothing to learn from.
            METRICS.empty_epochs.increment(1);
            return;
        }

        let (Some(min_delay), Some(max_delay)) = (self.min_delay, summary.max_delay) else {
            return;
        };

        let prev_max_delay = summary.prev_max_delay.unwrap_or(max_delay);
        let target = self.target.update(prev_max_delay, summary.delta, min_delay);
        let prev_window = self.window;
        self.window = self.selector.select(target, &mut self.profile, self.window);

        trace!(
            samples = summary.samples,
            max_delay,
            delta = summary.delta,
            min_delay,
            target,
            prev_window,
            window = self.window,
            "epoch processed"
        );
        METRICS.target_delay_ms.set(target);
        METRICS.window.set(self.window);
    }

    fn exit_slow_start(&mut self, min_delay: f64) {
        self.phase = Phase::SteadyState;
        if self.is_delay_triggered() {
            self.target.set(self.rtte.srtt_ms(), min_delay);
            self.epoch.restart(self.env.now());
        }
        METRICS.slow_start_exits.increment(1);
        debug!(
            window = self.window,
            target = self.target.target(),
            min_delay,
            "exited slow start"
        );
    }

    fn enter_loss_recovery(&mut self, cause: LossCause) {
        let prev_window = self.window;
        self.window = (self.window * self.opts.multiplicative_decrease).max(MIN_RECOVERY_WINDOW);
        if self.is_delay_triggered() {
            if let Some(min_delay) = self.min_delay {
                self.target.reset(min_delay);
            }
        }
        self.epoch.discard();
        let prev_phase = self.phase;
        self.phase = Phase::LossRecovery;

        match cause {
            LossCause::Gap => METRICS.loss_recovery_enter_gap.increment(1),
            LossCause::Delay => METRICS.loss_recovery_enter_delay.increment(1),
            LossCause::Timeout => METRICS.loss_recovery_enter_timeout.increment(1),
        }
        METRICS.window.set(self.window);
        debug!(
            ?cause,
            ?prev_phase,
            prev_window,
            window = self.window,
            target = self.target.target(),
            "entered loss recovery"
        );
    }

    fn exit_loss_recovery(&mut self, sent_window: u32) {
        self.window = self.selector.clamp(self.window);
        self.phase = Phase::SteadyState;
        if self.is_delay_triggered() {
            self.epoch.restart(self.env.now());
        }
        METRICS.loss_recovery_exits.increment(1);
        METRICS.window.set(self.window);
        debug!(sent_window, window = self.window, "exited loss recovery");
    }
}

impl<E: Environment> CongestionController for Controller<E> {
    fn window_size(&mut self) -> u32 {
        if self.is_delay_triggered()
            && self.phase == Phase::SteadyState
            && self.epoch.is_due(self.env.now())
        {
            self.on_epoch_boundary();
        }
        self.current_window()
    }

    fn datagram_was_sent(&mut self, seq: SeqNr, send_timestamp_ms: u64, after_timeout: bool) {
        let window = self.current_window();
        self.sent_windows.insert(seq, window);
        METRICS.datagrams_sent.increment(1);
        trace!(?seq, send_timestamp_ms, after_timeout, window, "datagram sent");

        if !after_timeout {
            return;
        }
        self.rtte.on_timeout();
        if self.opts.kind != ControllerKind::Fixed && self.phase != Phase::LossRecovery {
            self.enter_loss_recovery(LossCause::Timeout);
        }
    }

    fn ack_received(
        &mut self,
        seq: SeqNr,
        send_timestamp_ms: u64,
        recv_timestamp_ms: u64,
        ack_received_timestamp_ms: u64,
    ) {
        let delay = (ack_received_timestamp_ms.saturating_sub(send_timestamp_ms) as f64)
            .max(MIN_DELAY_SAMPLE_MS);
        METRICS.acks_received.increment(1);
        METRICS.ack_delay_ms.record(delay);

        let min_delay = self.min_delay.map_or(delay, |m| m.min(delay));
        self.min_delay = Some(min_delay);

        let sent_window = self.sent_windows.take(seq);
        if sent_window.is_none() {
            METRICS.untracked_acks.increment(1);
        }

        // Anything but the next sequence number, duplicates and reordering included.
        let gap = self.highest_acked.is_some_and(|h| !seq.follows(h));
        if self.highest_acked.is_some_and(|h| seq <= h) {
            METRICS.stale_acks.increment(1);
        }
        self.highest_acked = Some(self.highest_acked.map_or(seq, |h| h.max(seq)));

        // Judge this ack against the estimate from before it arrived.
        let delay_estimate = self.delay_estimate();
        self.rtte.sample(delay);

        trace!(
            ?seq,
            send_timestamp_ms,
            recv_timestamp_ms,
            ack_received_timestamp_ms,
            delay,
            ?sent_window,
            phase = ?self.phase,
            "ack received"
        );

        match self.phase {
            Phase::SlowStart => {
                if gap {
                    self.enter_loss_recovery(LossCause::Gap);
                    return;
                }
                self.window = self.selector.clamp(self.window + 1.);

                if delay > self.opts.slow_start_delay_threshold * min_delay
                    || self.window >= self.opts.slow_start_max_window as f64
                {
                    self.exit_slow_start(min_delay);
                }
            }
            Phase::SteadyState => match self.opts.kind {
                ControllerKind::Fixed => {}
                ControllerKind::Aimd => {
                    if gap {
                        self.enter_loss_recovery(LossCause::Gap);
                        return;
                    }
                    self.window = self
                        .selector
                        .clamp(self.window + self.opts.additive_growth / self.window);
                }
                ControllerKind::DelayTriggered => {
                    if gap {
                        self.enter_loss_recovery(LossCause::Gap);
                        return;
                    }
                    if delay > self.opts.loss_delay_multiplier * delay_estimate {
                        self.enter_loss_recovery(LossCause::Delay);
                        return;
                    }
                    self.record_profile(sent_window, delay);
                    self.epoch.observe(delay);
                }
            },
            Phase::LossRecovery => {
                let window = self.window.max(MIN_RECOVERY_WINDOW);
                self.window = window + 1. / window;
                if let Some(max) = self.opts.max_window {
                    self.window = self.window.min(max as f64);
                }

                // Acks for datagrams sent with a window no larger than the current one
                // mean everything queued before the cut has drained.
                if let Some(sent_window) = sent_window {
                    if sent_window as f64 <= self.window {
                        self.exit_loss_recovery(sent_window);
                    }
                }
            }
        }
    }

    fn timeout_ms(&self) -> u64 {
        if self.opts.kind == ControllerKind::Fixed {
            return self.opts.fallback_timeout.as_millis() as u64;
        }
        let ms = (self.opts.timeout_multiplier * self.delay_estimate()).round() as u64;
        ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS)
    }

    fn state(&self) -> ControllerState {
        ControllerState {
            phase: self.phase,
            window: self.window,
            target_delay_ms: self.target.target(),
            min_delay_ms: self.min_delay,
        }
    }
}
