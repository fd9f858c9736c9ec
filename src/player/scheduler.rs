//! Retry timers
//!
//! Each timer carries a generation number that is bumped by every schedule
//! and cancel, so a sleeping thread fires only if nothing replaced or
//! cancelled it meanwhile. The controller also drops any `RetryElapsed`
//! that arrives for a session it no longer owns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::engine::{PlayerEvent, SessionId};

/// Identifies a scheduled retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryTicket {
    pub session: SessionId,
    pub attempt: u32,
}

/// An event addressed to a specific session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub event: PlayerEvent,
}

pub trait RetryScheduler {
    /// Deliver `RetryElapsed { attempt }` for `ticket.session` after `delay`.
    /// Replaces any timer still pending.
    fn schedule(&mut self, delay: Duration, ticket: RetryTicket);

    /// Drop every pending timer of `session`
    fn cancel(&mut self, session: SessionId);
}

/// Sleeps on a background thread and posts the event to the host's
/// event channel
pub struct ThreadScheduler {
    events: Sender<SessionEvent>,
    /// Generation of the only timer allowed to fire
    generation: Arc<AtomicU64>,
    /// Session owning the armed timer
    armed: Option<SessionId>,
}

impl ThreadScheduler {
    pub fn new(events: Sender<SessionEvent>) -> Self {
        Self {
            events,
            generation: Arc::new(AtomicU64::new(0)),
            armed: None,
        }
    }
}

impl RetryScheduler for ThreadScheduler {
    fn schedule(&mut self, delay: Duration, ticket: RetryTicket) {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.armed = Some(ticket.session);
        let generation = Arc::clone(&self.generation);
        let events = self.events.clone();

        thread::spawn(move || {
            thread::sleep(delay);
            if generation.load(Ordering::SeqCst) != mine {
                debug!(session = ticket.session, "Retry timer cancelled");
                return;
            }
            let _ = events.send(SessionEvent {
                session: ticket.session,
                event: PlayerEvent::RetryElapsed { attempt: ticket.attempt },
            });
        });
    }

    fn cancel(&mut self, session: SessionId) {
        if self.armed == Some(session) {
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.armed = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_timer_fires_for_live_session() {
        let (tx, rx) = channel();
        let mut scheduler = ThreadScheduler::new(tx);
        scheduler.schedule(Duration::from_millis(5), RetryTicket { session: 7, attempt: 1 });

        let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received.session, 7);
        assert_eq!(received.event, PlayerEvent::RetryElapsed { attempt: 1 });
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let (tx, rx) = channel();
        let mut scheduler = ThreadScheduler::new(tx);
        scheduler.schedule(Duration::from_millis(20), RetryTicket { session: 3, attempt: 1 });
        scheduler.cancel(3);

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_newer_session_supersedes_old_timer() {
        let (tx, rx) = channel();
        let mut scheduler = ThreadScheduler::new(tx);
        scheduler.schedule(Duration::from_millis(30), RetryTicket { session: 1, attempt: 1 });
        scheduler.cancel(1);
        scheduler.schedule(Duration::from_millis(5), RetryTicket { session: 2, attempt: 1 });

        let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received.session, 2);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_cancelled_timer_stays_dead_after_reschedule() {
        let (tx, rx) = channel();
        let mut scheduler = ThreadScheduler::new(tx);
        scheduler.schedule(Duration::from_millis(20), RetryTicket { session: 1, attempt: 1 });
        scheduler.cancel(1);
        scheduler.schedule(Duration::from_millis(400), RetryTicket { session: 1, attempt: 2 });

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received.event, PlayerEvent::RetryElapsed { attempt: 2 });
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_cancel_of_other_session_keeps_timer() {
        let (tx, rx) = channel();
        let mut scheduler = ThreadScheduler::new(tx);
        scheduler.schedule(Duration::from_millis(5), RetryTicket { session: 4, attempt: 1 });
        scheduler.cancel(9);

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap().session, 4);
    }
}
