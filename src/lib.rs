//! Congestion window controller for datagram senders.
//!
//! The send loop owns the socket, timers and framing. It drives a
//! [CongestionController] through four calls:
//!
//! - [CongestionController::window_size] before sending (also serves as the tick),
//! - [CongestionController::datagram_was_sent] for every datagram put on the wire,
//! - [CongestionController::ack_received] for every acknowledgement,
//! - [CongestionController::timeout_ms] to arm the retransmission timer.

#[macro_use]
mod macros;

pub mod congestion;
mod constants;
mod controller;
mod error;
mod metrics;
mod opts;
mod rtte;
mod seq_nr;
#[cfg(test)]
mod test_util;
mod traits;
mod utils;

pub use congestion::{CongestionController, ControllerState, Phase};
pub use controller::Controller;
pub use error::{Error, Result};
pub use opts::{ControllerKind, ControllerOpts};
pub use seq_nr::SeqNr;
pub use traits::{DefaultEnvironment, Environment};
