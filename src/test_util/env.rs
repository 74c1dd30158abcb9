use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::Mutex;

use crate::traits::Environment;

struct MockEnvironmentInner {
    now: Instant,
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone)]
pub struct MockEnvironment {
    inner: Arc<Mutex<MockEnvironmentInner>>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockEnvironmentInner {
                now: Instant::now(),
            })),
        }
    }

    pub fn increment_now(&self, dur: Duration) {
        self.inner.lock().now += dur;
    }
}

impl Environment for MockEnvironment {
    fn now(&self) -> Instant {
        self.inner.lock().now
    }
}
