//! Durable-store health state machine.
//!
//! The publisher consults [`StoreHealthTracker::decide`] before every publish
//! and feeds the outcome of each probe or upload back through
//! [`StoreHealthTracker::record`].

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreHealth {
    Unknown,
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthEvent {
    ProbeSucceeded,
    ProbeFailed,
    UploadSucceeded,
    UploadFailed,
}

/// What the publisher should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDecision {
    /// Check the bucket first, then upload.
    Probe,
    /// Upload straight away.
    Upload,
    /// Keep the file local.
    Fallback,
}

impl StoreHealth {
    pub fn transition(self, event: HealthEvent) -> StoreHealth {
        match event {
            HealthEvent::ProbeSucceeded | HealthEvent::UploadSucceeded => StoreHealth::Available,
            HealthEvent::ProbeFailed | HealthEvent::UploadFailed => StoreHealth::Unavailable,
        }
    }

    /// Decide the next step given how long ago the state was last confirmed.
    ///
    /// A confirmed state is trusted for `recheck_interval`; after that the
    /// store is probed again whichever way it last went.
    pub fn decide(self, since_checked: Option<Duration>, recheck_interval: Duration) -> PublishDecision {
        let fresh = since_checked.is_some_and(|age| age < recheck_interval);
        match (self, fresh) {
            (StoreHealth::Unknown, _) => PublishDecision::Probe,
            (StoreHealth::Available, true) => PublishDecision::Upload,
            (StoreHealth::Unavailable, true) => PublishDecision::Fallback,
            (_, false) => PublishDecision::Probe,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoreHealth::Unknown => "unknown",
            StoreHealth::Available => "available",
            StoreHealth::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug)]
struct HealthState {
    health: StoreHealth,
    checked_at: Option<Instant>,
}

/// Shared health of the durable store, with the time it was last confirmed.
#[derive(Debug)]
pub struct StoreHealthTracker {
    state: Mutex<HealthState>,
    recheck_interval: Duration,
}

impl StoreHealthTracker {
    pub fn new(recheck_interval: Duration) -> Self {
        Self {
            state: Mutex::new(HealthState {
                health: StoreHealth::Unknown,
                checked_at: None,
            }),
            recheck_interval,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HealthState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> StoreHealth {
        self.lock().health
    }

    pub fn decide(&self) -> PublishDecision {
        let state = self.lock();
        let since = state.checked_at.map(|at| at.elapsed());
        state.health.decide(since, self.recheck_interval)
    }

    pub fn record(&self, event: HealthEvent) -> StoreHealth {
        let mut state = self.lock();
        let previous = state.health;
        state.health = previous.transition(event);
        state.checked_at = Some(Instant::now());
        if previous != state.health {
            tracing::info!(
                from = previous.as_str(),
                to = state.health.as_str(),
                event = ?event,
                "Object store health changed"
            );
        }
        state.health
    }
}
