pub mod delay_profile;
pub mod epoch;
pub mod selector;
pub mod seq_window;
pub mod target;
pub mod tracing;

use crate::seq_nr::SeqNr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    SlowStart,
    SteadyState,
    LossRecovery,
}

/// A snapshot of the controller's decision state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    pub phase: Phase,
    /// Real-valued window, in datagrams.
    pub window: f64,
    pub target_delay_ms: Option<f64>,
    pub min_delay_ms: Option<f64>,
}

/// The interface the send loop drives.
///
/// All methods are cheap and never block. Calls must be serialized by the caller.
pub trait CongestionController: Send + Sync + core::fmt::Debug {
    /// How many datagrams may be in flight. Also acts as the periodic tick:
    /// the send loop is expected to call it on every scheduling pass.
    fn window_size(&mut self) -> u32;

    fn datagram_was_sent(&mut self, seq: SeqNr, send_timestamp_ms: u64, after_timeout: bool);

    /// `send_timestamp_ms` and `ack_received_timestamp_ms` are on the sender's clock,
    /// `recv_timestamp_ms` on the receiver's.
    fn ack_received(
        &mut self,
        seq: SeqNr,
        send_timestamp_ms: u64,
        recv_timestamp_ms: u64,
        ack_received_timestamp_ms: u64,
    );

    /// How long to wait without acks before sending one more datagram.
    fn timeout_ms(&self) -> u64;

    fn state(&self) -> ControllerState;
}
