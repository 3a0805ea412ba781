use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use altslave_frame::MessageSnapshot;

/// Result of waiting on a [`SessionSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// A session completed: the new generation and both buffers as they
    /// stood when it ended.
    Completed(u64, MessageSnapshot),
    /// The timeout elapsed first.
    TimedOut,
    /// The signal was closed.
    Closed,
}

#[derive(Debug, Default)]
struct SignalState {
    generation: u64,
    last: Option<MessageSnapshot>,
    closed: bool,
}

/// Counts completed sessions and wakes threads waiting for the next one.
///
/// Each completion publishes the buffers captured at its stop condition, so
/// a waiter that wakes late still sees that session rather than whatever the
/// next one has written since.
#[derive(Debug, Default)]
pub struct SessionSignal {
    state: Mutex<SignalState>,
    cond: Condvar,
}

impl SessionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions completed so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Record a completed session with its buffers and wake all waiters.
    pub fn complete(&self, snapshot: MessageSnapshot) {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        state.last = Some(snapshot);
        self.cond.notify_all();
    }

    /// Wake all waiters for good; later waits return [`Wait::Closed`].
    pub fn close(&self) {
        self.lock().closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Block until the generation moves past `seen`, the signal closes, or
    /// `timeout` elapses.
    pub fn wait_past(&self, seen: u64, timeout: Duration) -> Wait {
        let (state, _) = self
            .cond
            .wait_timeout_while(self.lock(), timeout, |s| {
                !s.closed && s.generation == seen
            })
            .unwrap_or_else(PoisonError::into_inner);

        if state.closed {
            return Wait::Closed;
        }
        match state.last {
            Some(snapshot) if state.generation != seen => {
                Wait::Completed(state.generation, snapshot)
            }
            _ => Wait::TimedOut,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use altslave_frame::{Channel, FrameAssembler};

    use super::*;

    fn snapshot_with(channel_selector: u8, bytes: &[u8]) -> MessageSnapshot {
        let mut asm = FrameAssembler::new();
        asm.on_session_start();
        asm.on_byte(channel_selector);
        for &b in bytes {
            asm.on_byte(b);
        }
        asm.store().snapshot()
    }

    #[test]
    fn complete_advances_generation() {
        let signal = SessionSignal::new();
        assert_eq!(signal.generation(), 0);
        signal.complete(MessageSnapshot::default());
        signal.complete(MessageSnapshot::default());
        assert_eq!(signal.generation(), 2);
    }

    #[test]
    fn wait_returns_immediately_when_already_past() {
        let signal = SessionSignal::new();
        let snap = snapshot_with(0, &[0x10]);
        signal.complete(snap);
        assert_eq!(
            signal.wait_past(0, Duration::from_millis(1)),
            Wait::Completed(1, snap)
        );
    }

    #[test]
    fn wait_yields_latest_published_buffers() {
        let signal = SessionSignal::new();
        signal.complete(snapshot_with(0, &[0x01]));
        signal.complete(snapshot_with(1, &[0x02]));

        match signal.wait_past(0, Duration::from_millis(1)) {
            Wait::Completed(generation, snap) => {
                assert_eq!(generation, 2);
                assert_eq!(snap.channel(Channel::B)[0], 0x02);
                assert_eq!(snap.channel(Channel::A)[0], 0x00);
            }
            other => panic!("unexpected wait result: {other:?}"),
        }
    }

    #[test]
    fn wait_times_out() {
        let signal = SessionSignal::new();
        assert_eq!(
            signal.wait_past(0, Duration::from_millis(20)),
            Wait::TimedOut
        );
    }

    #[test]
    fn wait_wakes_on_complete_from_other_thread() {
        let signal = Arc::new(SessionSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_past(0, Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        let snap = snapshot_with(0, &[0xab]);
        signal.complete(snap);

        assert_eq!(waiter.join().unwrap(), Wait::Completed(1, snap));
    }

    #[test]
    fn close_wakes_waiters() {
        let signal = Arc::new(SessionSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_past(0, Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        signal.close();

        assert_eq!(waiter.join().unwrap(), Wait::Closed);
        assert!(signal.is_closed());
    }
}
