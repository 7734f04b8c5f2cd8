// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session clocks.
//!
//! A recording session measures time in microseconds since the session
//! started. The clock is swappable: `WallClock` follows tokio's timer (and
//! therefore tokio's paused test time), while `VirtualClock` only moves when
//! a test advances it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Microseconds on the session timeline
pub type Micros = u64;

/// Convert a duration to whole microseconds, saturating at `u64::MAX`
pub fn to_micros(duration: Duration) -> Micros {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Future returned by [`Clock::sleep_until`]
pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Time source driving a recording session.
pub trait Clock: Send + Sync {
    /// Current time on the session timeline
    fn now(&self) -> Micros;

    /// Resolve once the clock has reached `at`
    fn sleep_until(&self, at: Micros) -> Sleep;
}

/// Wall clock anchored at construction time.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    /// Create a clock whose zero is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Instant corresponding to a session timestamp
    pub fn instant_at(&self, at: Micros) -> Instant {
        self.origin + Duration::from_micros(at)
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Micros {
        to_micros(self.origin.elapsed())
    }

    fn sleep_until(&self, at: Micros) -> Sleep {
        Box::pin(tokio::time::sleep_until(self.instant_at(at)))
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Cloning shares the underlying time.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    time: Arc<watch::Sender<Micros>>,
}

impl VirtualClock {
    /// Create a virtual clock at time zero
    pub fn new() -> Self {
        let (time, _) = watch::channel(0);
        Self {
            time: Arc::new(time),
        }
    }

    /// Move the clock forward to `at`. Moving backwards is ignored.
    pub fn advance_to(&self, at: Micros) {
        self.time.send_if_modified(|now| {
            if at > *now {
                *now = at;
                true
            } else {
                false
            }
        });
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        let target = self.now().saturating_add(to_micros(delta));
        self.advance_to(target);
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Micros {
        *self.time.borrow()
    }

    fn sleep_until(&self, at: Micros) -> Sleep {
        let mut rx = self.time.subscribe();
        Box::pin(async move {
            // The sender lives as long as any clone of the clock.
            let _ = rx.wait_for(|now| *now >= at).await;
        })
    }
}
