//! Virtual-time scheduler for one-shot and repeating timers.

use std::collections::BTreeMap;

/// Handle returned when a timer is scheduled; used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    payload: T,
    /// `Some(interval)` for repeating timers.
    interval_ms: Option<u64>,
}

/// A virtual-time scheduler with one-shot and repeating timers.
///
/// Time only moves when timers are popped or the scheduler is advanced, so
/// a whole session can be replayed deterministically without wall-clock
/// waits. Timers due at the same instant fire in the order they were
/// (re)scheduled.
///
/// # Examples
///
/// ```
/// use solar_rush::sim::clock::Scheduler;
///
/// let mut clock = Scheduler::new();
/// clock.schedule_every(1000, "tick");
/// clock.schedule_once(2500, "spike over");
///
/// let mut fired = Vec::new();
/// clock.run_until(3000, |at, what| fired.push((at, what)));
/// assert_eq!(
///     fired,
///     vec![(1000, "tick"), (2000, "tick"), (2500, "spike over"), (3000, "tick")]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    /// Current virtual time in milliseconds.
    now_ms: u64,
    /// Monotonic sequence used both for timer ids and tie-breaking.
    next_seq: u64,
    /// Pending timers keyed by `(due_ms, seq)`.
    queue: BTreeMap<(u64, u64), Timer<T>>,
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Scheduler<T> {
    /// Creates a scheduler at virtual time zero with no pending timers.
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of timers still pending.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Schedules `payload` to fire once, `delay_ms` after the current time.
    pub fn schedule_once(&mut self, delay_ms: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_seq);
        self.insert(self.now_ms + delay_ms, id, payload, None);
        id
    }

    /// Schedules `payload` to fire every `interval_ms`, first at `now + interval_ms`.
    ///
    /// # Panics
    ///
    /// Panics if `interval_ms` is zero.
    pub fn schedule_every(&mut self, interval_ms: u64, payload: T) -> TimerId {
        assert!(interval_ms > 0, "repeating timer interval must be > 0");
        let id = TimerId(self.next_seq);
        self.insert(self.now_ms + interval_ms, id, payload, Some(interval_ms));
        id
    }

    /// Cancels a pending timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self
            .queue
            .iter()
            .find_map(|(key, timer)| (timer.id == id).then_some(*key));
        match key {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    /// Pops the earliest timer due at or before `until_ms`.
    ///
    /// Moves the clock to the timer's due time and re-arms repeating timers.
    ///
    /// # Returns
    ///
    /// * `Some((due_ms, payload))` - The next due timer
    /// * `None` - If no timer is due by `until_ms`
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(u64, T)> {
        let (&(due_ms, seq), _) = self.queue.first_key_value()?;
        if due_ms > until_ms {
            return None;
        }
        let timer = self.queue.remove(&(due_ms, seq))?;
        self.now_ms = self.now_ms.max(due_ms);

        let payload = timer.payload.clone();
        if let Some(interval_ms) = timer.interval_ms {
            self.insert(due_ms + interval_ms, timer.id, timer.payload, Some(interval_ms));
        }
        Some((due_ms, payload))
    }

    /// Moves the clock forward to `until_ms` without firing anything.
    ///
    /// Timers that were due before `until_ms` stay queued and fire on the
    /// next [`pop_due`](Self::pop_due).
    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    /// Fires every timer due up to and including `until_ms`, then parks the
    /// clock at `until_ms`.
    pub fn run_until(&mut self, until_ms: u64, mut f: impl FnMut(u64, T)) {
        while let Some((at, payload)) = self.pop_due(until_ms) {
            f(at, payload);
        }
        self.advance_to(until_ms);
    }

    fn insert(&mut self, due_ms: u64, id: TimerId, payload: T, interval_ms: Option<u64>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert(
            (due_ms, seq),
            Timer {
                id,
                payload,
                interval_ms,
            },
        );
    }
}
