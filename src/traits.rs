use std::time::Instant;

/// Source of wall-clock time for the controller.
///
/// Epoch boundaries are detected by reading this clock. Tests and the simulator
/// substitute a mock clock that is advanced explicitly.
pub trait Environment: Send + Sync + Unpin + 'static {
    fn now(&self) -> Instant;
}

#[derive(Default, Clone, Copy, Debug)]
pub struct DefaultEnvironment {}

impl Environment for DefaultEnvironment {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
