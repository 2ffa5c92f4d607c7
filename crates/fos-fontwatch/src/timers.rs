//! Timer queue
//!
//! Single-threaded timeouts keyed by id. Time is passed in by the caller so
//! the queue works the same on wall-clock and virtual time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub type TimerId = u32;

/// Timer entry
#[derive(Debug, Clone)]
pub struct Timer<T> {
    pub id: TimerId,
    pub task: T,
    pub delay: Duration,
    pub scheduled_at: Instant,
}

impl<T> Timer<T> {
    pub fn due(&self) -> Instant {
        self.scheduled_at + self.delay
    }
}

/// Pending one-shot timers
#[derive(Debug)]
pub struct TimerQueue<T> {
    timers: HashMap<TimerId, Timer<T>>,
    next_id: TimerId,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            timers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Add a timeout
    pub fn set_timeout(&mut self, task: T, delay: Duration, now: Instant) -> TimerId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.timers.insert(id, Timer {
            id,
            task,
            delay,
            scheduled_at: now,
        });
        id
    }

    /// Clear a timer
    pub fn clear(&mut self, id: TimerId) -> Option<T> {
        self.timers.remove(&id).map(|timer| timer.task)
    }

    /// Clear every timer
    pub fn clear_all(&mut self) {
        self.timers.clear();
    }

    /// Remove and return timers due at `now`, earliest first
    pub fn take_ready(&mut self, now: Instant) -> Vec<Timer<T>> {
        let ready_ids: Vec<TimerId> = self.timers
            .values()
            .filter(|timer| timer.due() <= now)
            .map(|timer| timer.id)
            .collect();

        let mut ready: Vec<Timer<T>> = ready_ids
            .into_iter()
            .filter_map(|id| self.timers.remove(&id))
            .collect();
        ready.sort_by_key(|timer| (timer.due(), timer.id));
        ready
    }

    /// Check if there are pending timers
    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest due time
    pub fn next_due(&self) -> Option<Instant> {
        self.timers.values().map(Timer::due).min()
    }

    /// Get time until next timer fires
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due().map(|due| due.saturating_duration_since(now))
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_queue() {
        let now = Instant::now();
        let mut tq = TimerQueue::new();

        let id1 = tq.set_timeout("cb1", Duration::from_millis(100), now);
        let id2 = tq.set_timeout("cb2", Duration::from_millis(200), now);

        assert!(tq.has_pending());
        assert_eq!(tq.len(), 2);

        assert_eq!(tq.clear(id1), Some("cb1"));
        assert!(tq.has_pending()); // Still has id2

        tq.clear(id2);
        assert!(!tq.has_pending());
        assert_eq!(tq.clear(id2), None);
    }

    #[test]
    fn test_take_ready_in_due_order() {
        let now = Instant::now();
        let mut tq = TimerQueue::new();

        tq.set_timeout("late", Duration::from_millis(50), now);
        tq.set_timeout("first", Duration::ZERO, now);
        tq.set_timeout("second", Duration::ZERO, now);
        tq.set_timeout("future", Duration::from_millis(500), now);

        assert!(tq.take_ready(now - Duration::from_millis(1)).is_empty());

        let ready: Vec<_> = tq.take_ready(now + Duration::from_millis(50))
            .into_iter()
            .map(|timer| timer.task)
            .collect();
        assert_eq!(ready, vec!["first", "second", "late"]);
        assert_eq!(tq.len(), 1);
    }

    #[test]
    fn test_time_until_next() {
        let now = Instant::now();
        let mut tq = TimerQueue::new();
        assert_eq!(tq.time_until_next(now), None);

        tq.set_timeout((), Duration::from_millis(50), now);
        tq.set_timeout((), Duration::from_millis(20), now);
        assert_eq!(tq.time_until_next(now), Some(Duration::from_millis(20)));
        assert_eq!(tq.next_due(), Some(now + Duration::from_millis(20)));
        assert_eq!(tq.time_until_next(now + Duration::from_secs(1)), Some(Duration::ZERO));

        tq.clear_all();
        assert!(tq.is_empty());
    }
}
