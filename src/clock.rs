use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::sleep;

/// Wall-clock time source for the scheduler.
///
/// Runs are scheduled against calendar dates and times of day, so `now` is a
/// local `DateTime` rather than a monotonic instant. `sleep` is the only
/// suspension primitive the control loop uses; tests swap in
/// [`mock::MockClock`] to drive those suspensions without waiting real time.
pub trait Clock: Send + Sync + Clone + 'static {
    type SleepFuture: Future<Output = ()> + Send;

    fn now(&self) -> DateTime<Local>;
    fn sleep(&self, duration: Duration) -> Self::SleepFuture;
}

#[derive(Clone, Debug)]
pub struct SystemClock;

impl Clock for SystemClock {
    type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) -> Self::SleepFuture {
        Box::pin(sleep(duration))
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll, Waker};

    /// Manually advanced clock. Sleeps complete when `advance` moves the
    /// clock past their wake time.
    #[derive(Clone)]
    pub struct MockClock {
        state: Arc<Mutex<MockClockState>>,
    }

    struct MockClockState {
        now: DateTime<Local>,
        pending_sleeps: Vec<(DateTime<Local>, Waker)>,
    }

    impl MockClock {
        pub fn new(now: DateTime<Local>) -> Self {
            Self {
                state: Arc::new(Mutex::new(MockClockState {
                    now,
                    pending_sleeps: Vec::new(),
                })),
            }
        }

        pub fn advance(&self, duration: Duration) {
            let mut state = self.state.lock().unwrap();
            state.now = state.now + chrono::Duration::from_std(duration).unwrap();

            let now = state.now;
            let mut due = Vec::new();
            state.pending_sleeps.retain(|(wake_at, waker)| {
                if *wake_at <= now {
                    due.push(waker.clone());
                    false
                } else {
                    true
                }
            });
            drop(state);

            for waker in due {
                waker.wake();
            }
        }
    }

    impl Clock for MockClock {
        type SleepFuture = MockSleep;

        fn now(&self) -> DateTime<Local> {
            self.state.lock().unwrap().now
        }

        fn sleep(&self, duration: Duration) -> MockSleep {
            let wake_at = self.now() + chrono::Duration::from_std(duration).unwrap();
            MockSleep {
                clock: self.clone(),
                wake_at,
            }
        }
    }

    pub struct MockSleep {
        clock: MockClock,
        wake_at: DateTime<Local>,
    }

    impl Future for MockSleep {
        type Output = ();

        fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            let mut state = self.clock.state.lock().unwrap();
            if state.now >= self.wake_at {
                Poll::Ready(())
            } else {
                state.pending_sleeps.push((self.wake_at, cx.waker().clone()));
                Poll::Pending
            }
        }
    }
}
