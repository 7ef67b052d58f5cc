use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;

const TIMEOUT: Duration = Duration::from_secs(20 * 60);

// =============================================================================
// exceeded
// =============================================================================

#[test]
fn within_timeout_is_not_exceeded() {
    assert!(!exceeded(0, 0, TIMEOUT));
    assert!(!exceeded(0, 5 * 60 * 1000, TIMEOUT));
}

#[test]
fn exactly_at_timeout_is_not_exceeded() {
    assert!(!exceeded(0, 20 * 60 * 1000, TIMEOUT));
}

#[test]
fn past_timeout_is_exceeded() {
    assert!(exceeded(0, 20 * 60 * 1000 + 1, TIMEOUT));
}

#[test]
fn clock_skew_backwards_is_not_exceeded() {
    // A stored timestamp from the future (another tab, clock drift) must not
    // trigger a logout.
    assert!(!exceeded(10_000, 0, TIMEOUT));
}

#[test]
fn now_ms_is_a_plausible_epoch() {
    // Sometime after 2023 in epoch milliseconds.
    assert!(now_ms() > 1_700_000_000_000);
}

// =============================================================================
// InactivityTimer
// =============================================================================

fn counting_task(counter: &Arc<AtomicUsize>, delay: Duration) -> tokio::task::JoinHandle<()> {
    let counter = counter.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn default_timer_is_not_armed() {
    let timer = InactivityTimer::default();
    assert!(!timer.is_armed());
}

#[tokio::test(start_paused = true)]
async fn armed_timer_reports_armed() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut timer = InactivityTimer::default();
    timer.arm(counting_task(&counter, Duration::from_secs(5)));
    assert!(timer.is_armed());
}

#[tokio::test(start_paused = true)]
async fn cancel_prevents_firing() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut timer = InactivityTimer::default();
    timer.arm(counting_task(&counter, Duration::from_secs(5)));
    timer.cancel();
    assert!(!timer.is_armed());
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn rearming_aborts_the_previous_task() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut timer = InactivityTimer::default();
    timer.arm(counting_task(&counter, Duration::from_secs(5)));
    timer.arm(counting_task(&counter, Duration::from_secs(5)));
    tokio::time::sleep(Duration::from_secs(10)).await;
    // Exactly one firing: the first task was aborted by the second arm.
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn completed_task_reads_as_disarmed() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut timer = InactivityTimer::default();
    timer.arm(counting_task(&counter, Duration::from_millis(1)));
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(!timer.is_armed());
}
