use lazy_static::lazy_static;
use metrics::{Counter, Gauge, Histogram, counter, gauge, histogram};

pub struct Metrics {
    pub acks_received: Counter,
    pub ack_delay_ms: Histogram,
    pub datagrams_sent: Counter,
    pub epochs_processed: Counter,
    pub empty_epochs: Counter,
    pub loss_recovery_enter_gap: Counter,
    pub loss_recovery_enter_delay: Counter,
    pub loss_recovery_enter_timeout: Counter,
    pub loss_recovery_exits: Counter,
    pub slow_start_exits: Counter,
    pub stale_acks: Counter,
    pub target_delay_ms: Gauge,
    pub tracked_sequences_evicted: Counter,
    pub untracked_acks: Counter,
    pub window: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            acks_received: counter!("dgram_cc_acks_received"),
            ack_delay_ms: histogram!("dgram_cc_ack_delay_ms"),
            datagrams_sent: counter!("dgram_cc_datagrams_sent"),
            epochs_processed: counter!("dgram_cc_epochs_processed"),
            empty_epochs: counter!("dgram_cc_empty_epochs"),
            loss_recovery_enter_gap: counter!("dgram_cc_loss_recovery_enter", "cause" => "gap"),
            loss_recovery_enter_delay: counter!("dgram_cc_loss_recovery_enter", "cause" => "delay"),
            loss_recovery_enter_timeout: counter!("dgram_cc_loss_recovery_enter", "cause" => "timeout"),
            loss_recovery_exits: counter!("dgram_cc_loss_recovery_exits"),
            slow_start_exits: counter!("dgram_cc_slow_start_exits"),
            stale_acks: counter!("dgram_cc_stale_acks"),
            target_delay_ms: gauge!("dgram_cc_target_delay_ms"),
            tracked_sequences_evicted: counter!("dgram_cc_tracked_sequences_evicted"),
            untracked_acks: counter!("dgram_cc_untracked_acks"),
            window: gauge!("dgram_cc_window"),
        }
    }
}

lazy_static! {
    pub static ref METRICS: Metrics = Metrics::new();
}
