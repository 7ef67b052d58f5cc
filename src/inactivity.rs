//! Client-side inactivity timeout plumbing.
//!
//! DESIGN
//! ======
//! At most one scheduled logout task exists at a time: re-arming aborts the
//! previous task before storing the new handle, so two resets in a row leave
//! exactly one pending firing. Elapsed time across reloads and tab-hides is
//! evaluated from the durable last-active timestamp instead, since no timer
//! survives the page.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Handle to the single scheduled inactivity-logout task.
#[derive(Debug, Default)]
pub struct InactivityTimer {
    handle: Option<JoinHandle<()>>,
}

impl InactivityTimer {
    /// Replace any pending firing with `task`.
    pub fn arm(&mut self, task: JoinHandle<()>) {
        self.cancel();
        self.handle = Some(task);
    }

    /// Abort the pending firing, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

/// Whether the gap between `last_active_ms` and `now_ms` exceeds `timeout`.
#[must_use]
pub fn exceeded(last_active_ms: i64, now_ms: i64, timeout: Duration) -> bool {
    let timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_sub(last_active_ms) > timeout_ms
}

/// Current wall-clock instant as epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "inactivity_test.rs"]
mod tests;
