use crate::{
    constants::{CONGESTION_TRACING_LOG_EVERY_MS, CONGESTION_TRACING_LOG_LEVEL},
    seq_nr::SeqNr,
};

use super::{CongestionController, ControllerState};

/// Logs every change of the wrapped controller's state.
#[derive(Debug)]
pub struct TracingController<I> {
    inner: I,
}

impl<I> TracingController<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> CongestionController for TracingController<I>
where
    I: CongestionController + 'static,
{
    fn window_size(&mut self) -> u32 {
        log_every_ms_if_changed!(
            CONGESTION_TRACING_LOG_EVERY_MS,
            CONGESTION_TRACING_LOG_LEVEL,
            "window_size",
            self,
            |s| s.inner.state(),
            |s| s.inner.window_size()
        )
    }

    fn datagram_was_sent(&mut self, seq: SeqNr, send_timestamp_ms: u64, after_timeout: bool) {
        log_if_changed!(
            CONGESTION_TRACING_LOG_LEVEL,
            "datagram_was_sent",
            self,
            |s| s.inner.state(),
            |s| s
                .inner
                .datagram_was_sent(seq, send_timestamp_ms, after_timeout)
        )
    }

    fn ack_received(
        &mut self,
        seq: SeqNr,
        send_timestamp_ms: u64,
        recv_timestamp_ms: u64,
        ack_received_timestamp_ms: u64,
    ) {
        log_every_ms_if_changed!(
            CONGESTION_TRACING_LOG_EVERY_MS,
            CONGESTION_TRACING_LOG_LEVEL,
            "ack_received",
            self,
            |s| s.inner.state(),
            |s| s.inner.ack_received(
                seq,
                send_timestamp_ms,
                recv_timestamp_ms,
                ack_received_timestamp_ms
            )
        )
    }

    fn timeout_ms(&self) -> u64 {
        self.inner.timeout_ms()
    }

    fn state(&self) -> ControllerState {
        self.inner.state()
    }
}
