use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::runtime::AppEvent;
use crate::session::{Session, Status};
use crate::stats;
use crate::time_series::WpmSample;

/// Sampling period of the session clock
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Advance the session clock by one second and record a WPM sample.
///
/// Only running sessions tick; anything else is returned unchanged.
pub fn tick(session: &Session) -> Session {
    let mut next = session.clone();
    if next.status != Status::Running {
        return next;
    }

    next.time_left = next.time_left.saturating_sub(1);
    let elapsed = next.elapsed_secs();
    let wpm = stats::wpm(next.correct, elapsed);
    next.wpm_history.push(WpmSample::new(elapsed, wpm));

    if next.time_left == 0 {
        next.status = Status::Finished;
    }

    next
}

/// Identifies one periodic task; ticks carry the id of the task that sent them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Shared cancellation flag between a handle and its task
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owning handle to a periodic task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    token: CancelToken,
}

impl TimerHandle {
    pub fn new(id: TimerId) -> (Self, CancelToken) {
        let token = CancelToken::default();
        (
            Self {
                id,
                token: token.clone(),
            },
            token,
        )
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Starts periodic tasks that deliver `AppEvent::Tick(id)` back to the host
pub trait Scheduler {
    fn start(&mut self, id: TimerId, period: Duration) -> TimerHandle;
}

/// Production scheduler: one sleeping thread per task, feeding the event channel
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    tx: Sender<AppEvent>,
}

impl ThreadScheduler {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl Scheduler for ThreadScheduler {
    fn start(&mut self, id: TimerId, period: Duration) -> TimerHandle {
        let (handle, token) = TimerHandle::new(id);
        let tx = self.tx.clone();

        thread::spawn(move || loop {
            thread::sleep(period);
            if token.is_cancelled() {
                break;
            }
            if tx.send(AppEvent::Tick(id)).is_err() {
                break;
            }
        });

        tracing::debug!(timer = id.0, "timer started");
        handle
    }
}

/// Scheduler that never fires on its own; tests drive ticks explicitly
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    started: Rc<RefCell<Vec<(TimerId, CancelToken)>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently started task, if it has not been cancelled
    pub fn active(&self) -> Option<TimerId> {
        self.started
            .borrow()
            .last()
            .filter(|(_, token)| !token.is_cancelled())
            .map(|(id, _)| *id)
    }

    pub fn started_count(&self) -> usize {
        self.started.borrow().len()
    }

    pub fn is_cancelled(&self, id: TimerId) -> bool {
        self.started
            .borrow()
            .iter()
            .find(|(started, _)| *started == id)
            .map_or(true, |(_, token)| token.is_cancelled())
    }
}

impl Scheduler for ManualScheduler {
    fn start(&mut self, id: TimerId, _period: Duration) -> TimerHandle {
        let (handle, token) = TimerHandle::new(id);
        self.started.borrow_mut().push((id, token));
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;
    use crate::mode::Mode;
    use crate::typing_policy::apply;
    use std::sync::mpsc;

    fn running(prompt: &str, secs: u32) -> Session {
        let s = Session::new(prompt.to_string(), Mode::Words, secs);
        apply(&s, Key::Char(prompt.chars().next().unwrap()))
    }

    #[test]
    fn idle_sessions_do_not_tick() {
        let s = Session::new("abc".to_string(), Mode::Words, 10);
        assert_eq!(tick(&s), s);
    }

    #[test]
    fn tick_decrements_and_samples() {
        let s = tick(&running("hello", 10));

        assert_eq!(s.time_left, 9);
        assert_eq!(s.wpm_history, vec![WpmSample::new(1, 12)]);
        assert_eq!(s.status, Status::Running);
    }

    #[test]
    fn history_is_strictly_increasing() {
        let mut s = running("hello world", 5);
        let mut previous = 0;
        while s.status == Status::Running {
            s = tick(&s);
            let last = s.wpm_history.last().unwrap().elapsed_secs;
            assert!(last > previous);
            previous = last;
        }
        assert_eq!(s.wpm_history.len(), 5);
    }

    #[test]
    fn timeout_finishes_regardless_of_cursor() {
        let mut s = running("a long prompt", 3);
        for _ in 0..3 {
            s = tick(&s);
        }

        assert_eq!(s.time_left, 0);
        assert_eq!(s.status, Status::Finished);
        assert_eq!(s.cursor, 1);

        let after = tick(&s);
        assert_eq!(after, s);
    }

    #[test]
    fn dropping_handle_cancels_token() {
        let (handle, token) = TimerHandle::new(TimerId(3));
        assert!(!token.is_cancelled());
        drop(handle);
        assert!(token.is_cancelled());
    }

    #[test]
    fn manual_scheduler_tracks_cancellation() {
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.start(TimerId(1), TICK_PERIOD);
        assert_eq!(scheduler.active(), Some(TimerId(1)));

        drop(handle);
        assert_eq!(scheduler.active(), None);
        assert!(scheduler.is_cancelled(TimerId(1)));
        assert_eq!(scheduler.started_count(), 1);
    }

    #[test]
    fn thread_scheduler_delivers_ticks_until_cancelled() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = ThreadScheduler::new(tx);
        let handle = scheduler.start(TimerId(7), Duration::from_millis(5));

        match rx.recv_timeout(Duration::from_secs(2)) {
            Ok(AppEvent::Tick(id)) => assert_eq!(id, TimerId(7)),
            other => panic!("expected tick, got {other:?}"),
        }

        drop(handle);
        // Drain anything already in flight, then the channel must go quiet.
        std::thread::sleep(Duration::from_millis(30));
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
