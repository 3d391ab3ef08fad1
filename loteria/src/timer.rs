//! Cancellable timers on a virtual clock.
//!
//! Components never touch a runtime timer API directly. They schedule events
//! through a [`Scheduler`] and get a [`TimerHandle`] back, and the owner of
//! the [`TimerQueue`] decides when time moves: tests step it by hand, the
//! round actor maps it onto tokio's clock.

use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use crate::bot::PendingReaction;

/// Timers never repeat faster than this.
const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimerHandle(u64);

/// Events a round schedules.
#[derive(Clone, Debug, PartialEq)]
pub enum TimerEvent {
    CantorTick,
    BotReaction(PendingReaction),
}

pub trait Scheduler<E> {
    /// Current virtual time since the clock started.
    fn now(&self) -> Duration;

    fn schedule_once(&mut self, delay: Duration, event: E) -> TimerHandle;

    fn schedule_repeating(&mut self, period: Duration, event: E) -> TimerHandle;

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled before.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    fn is_pending(&self, handle: TimerHandle) -> bool;
}

/// A timer that came due.
#[derive(Clone, Debug, PartialEq)]
pub struct Fired<E> {
    pub handle: TimerHandle,
    pub at: Duration,
    pub event: E,
}

#[derive(Debug)]
struct Entry<E> {
    handle: TimerHandle,
    period: Option<Duration>,
    event: E,
}

/// Timers ordered by (deadline, insertion order).
#[derive(Debug)]
pub struct TimerQueue<E> {
    now: Duration,
    next_handle: u64,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), Entry<E>>,
    index: HashMap<TimerHandle, (Duration, u64)>,
}

impl<E: Clone> Default for TimerQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> TimerQueue<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_handle: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.first_key_value().map(|((deadline, _), _)| *deadline)
    }

    /// Remove and return the earliest timer due at or before `until`.
    ///
    /// Timers come out one at a time so that the caller may schedule or
    /// cancel others between firings. The clock moves to the fired
    /// deadline. Repeating timers are re-armed under the same handle.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<E>> {
        let (&key, _) = self.queue.first_key_value()?;
        if key.0 > until {
            return None;
        }

        let entry = self.queue.remove(&key)?;
        let at = key.0;
        if at > self.now {
            self.now = at;
        }

        let handle = entry.handle;
        let event = match entry.period {
            Some(period) => {
                let event = entry.event.clone();
                let next_key = (at + period, self.bump_seq());
                self.index.insert(handle, next_key);
                self.queue.insert(next_key, entry);
                event
            }
            None => {
                self.index.remove(&handle);
                entry.event
            }
        };

        Some(Fired { handle, at, event })
    }

    /// Move the clock forward without firing anything. Never moves back.
    pub fn advance_to(&mut self, time: Duration) {
        if time > self.now {
            self.now = time;
        }
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.index.clear();
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;

        let key = (self.now + delay, self.bump_seq());
        self.index.insert(handle, key);
        self.queue.insert(
            key,
            Entry {
                handle,
                period,
                event,
            },
        );
        handle
    }
}

impl<E: Clone> Scheduler<E> for TimerQueue<E> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule_once(&mut self, delay: Duration, event: E) -> TimerHandle {
        self.insert(delay, None, event)
    }

    fn schedule_repeating(&mut self, period: Duration, event: E) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        self.insert(period, Some(period), event)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.index.remove(&handle) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    fn is_pending(&self, handle: TimerHandle) -> bool {
        self.index.contains_key(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn drain(queue: &mut TimerQueue<&'static str>, until: Duration) -> Vec<&'static str> {
        let mut fired = Vec::new();
        while let Some(timer) = queue.pop_due(until) {
            fired.push(timer.event);
        }
        queue.advance_to(until);
        fired
    }

    #[test]
    fn test_fires_in_deadline_then_insertion_order() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(ms(200), "late");
        queue.schedule_once(ms(100), "first");
        queue.schedule_once(ms(100), "second");

        assert_eq!(queue.next_deadline(), Some(ms(100)));
        assert_eq!(drain(&mut queue, ms(150)), vec!["first", "second"]);
        assert_eq!(queue.now(), ms(150));
        assert_eq!(drain(&mut queue, ms(500)), vec!["late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_once(ms(100), "cancelled");
        assert!(queue.is_pending(handle));
        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle), "Cancelling twice is a no-op");
        assert!(!queue.is_pending(handle));
        assert!(drain(&mut queue, ms(1000)).is_empty());
    }

    #[test]
    fn test_repeating_timer_keeps_handle() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_repeating(ms(100), "tick");

        let first = queue.pop_due(ms(250)).unwrap();
        let second = queue.pop_due(ms(250)).unwrap();
        assert_eq!(first.handle, handle);
        assert_eq!(second.handle, handle);
        assert_eq!(first.at, ms(100));
        assert_eq!(second.at, ms(200));
        assert!(queue.pop_due(ms(250)).is_none());
        assert!(queue.is_pending(handle));

        assert!(queue.cancel(handle));
        assert!(drain(&mut queue, ms(1000)).is_empty());
    }

    #[test]
    fn test_schedule_relative_to_now() {
        let mut queue = TimerQueue::new();
        queue.advance_to(ms(1000));
        queue.schedule_once(ms(50), "later");
        assert_eq!(queue.next_deadline(), Some(ms(1050)));
    }

    #[test]
    fn test_clock_never_moves_back() {
        let mut queue: TimerQueue<&str> = TimerQueue::new();
        queue.advance_to(ms(500));
        queue.advance_to(ms(100));
        assert_eq!(queue.now(), ms(500));
    }

    #[test]
    fn test_handler_can_cancel_between_firings() {
        let mut queue = TimerQueue::new();
        queue.schedule_once(ms(10), "canceller");
        let victim = queue.schedule_once(ms(10), "victim");

        let fired = queue.pop_due(ms(10)).unwrap();
        assert_eq!(fired.event, "canceller");
        queue.cancel(victim);
        assert!(queue.pop_due(ms(10)).is_none());
    }
}
