//! Virtual-clock timer queue.
//!
//! The host drives time with `pop_due`/`advance_clock`. Tasks are plain
//! values, so pending continuations can be inspected and voided as a group.
//! A cancelled task is removed from the queue and can never be returned.
use std::collections::BTreeMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scout_core::Delay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(u64);

#[derive(Debug)]
struct Entry<T> {
    task: T,
    /// Recurring timers are outside the `cancel_all` group.
    period_ms: Option<u64>,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_token: u64,
    queue: BTreeMap<(u64, TimerToken), Entry<T>>,
    rng: StdRng,
}

/// `base + uniform(-spread, spread)`, floored at zero.
pub fn jittered(base: Duration, spread: Duration, rng: &mut impl Rng) -> Duration {
    let base_ms = duration_ms(base) as i64;
    let spread_ms = duration_ms(spread) as i64;
    let offset = if spread_ms == 0 {
        0
    } else {
        rng.gen_range(-spread_ms..=spread_ms)
    };
    Duration::from_millis(base_ms.saturating_add(offset).max(0) as u64)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX / 4)
}

impl<T: Clone> Scheduler<T> {
    pub fn new(now_ms: u64) -> Self {
        Self::with_rng(now_ms, StdRng::from_entropy())
    }

    /// Deterministic jitter for replays and tests.
    pub fn with_seed(now_ms: u64, seed: u64) -> Self {
        Self::with_rng(now_ms, StdRng::seed_from_u64(seed))
    }

    fn with_rng(now_ms: u64, rng: StdRng) -> Self {
        engine_logging::set_clock_ms(now_ms);
        Self {
            now_ms,
            next_token: 0,
            queue: BTreeMap::new(),
            rng,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn jitter(&mut self, base: Duration, spread: Duration) -> Duration {
        jittered(base, spread, &mut self.rng)
    }

    pub fn after(&mut self, delay: Duration, task: T) -> TimerToken {
        self.insert(duration_ms(delay), task, None)
    }

    pub fn after_delay(&mut self, delay: Delay, task: T) -> TimerToken {
        let delay = match delay {
            Delay::Fixed(delay) => delay,
            Delay::Jittered { base, spread } => self.jitter(base, spread),
        };
        self.after(delay, task)
    }

    /// Recurring timer; survives `cancel_all` and is removed by `shutdown`.
    pub fn every(&mut self, period: Duration, task: T) -> TimerToken {
        let period_ms = duration_ms(period).max(1);
        self.insert(period_ms, task, Some(period_ms))
    }

    /// Deadlines are at least 1 ms ahead, so a task scheduled while firing
    /// never runs in the same `pop_due` pass.
    fn insert(&mut self, delay_ms: u64, task: T, period_ms: Option<u64>) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        let deadline = self.now_ms.saturating_add(delay_ms.max(1));
        self.queue
            .insert((deadline, token), Entry { task, period_ms });
        token
    }

    /// Void every pending one-shot continuation. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, entry| entry.period_ms.is_some());
        before - self.queue.len()
    }

    /// Drop everything, recurring timers included.
    pub fn shutdown(&mut self) {
        self.queue.clear();
    }

    /// Pending one-shot continuations.
    pub fn pending(&self) -> usize {
        self.queue
            .values()
            .filter(|entry| entry.period_ms.is_none())
            .count()
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.queue.keys().any(|(_, t)| *t == token)
    }

    /// Pending one-shot continuations with their deadlines, earliest first.
    pub fn pending_tasks(&self) -> impl Iterator<Item = (u64, &T)> {
        self.queue
            .iter()
            .filter(|(_, entry)| entry.period_ms.is_none())
            .map(|((deadline, _), entry)| (*deadline, &entry.task))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest task due at or before `until_ms`, moving the clock to
    /// its deadline. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerToken, T)> {
        let (&(deadline, token), _) = self.queue.first_key_value()?;
        if deadline > until_ms {
            return None;
        }
        let entry = self.queue.remove(&(deadline, token))?;
        self.set_now(deadline);
        let task = match entry.period_ms {
            Some(period_ms) => {
                let task = entry.task.clone();
                self.queue
                    .insert((deadline.saturating_add(period_ms), token), entry);
                task
            }
            None => entry.task,
        };
        Some((token, task))
    }

    /// Move the clock forward once every due task has been popped.
    pub fn advance_clock(&mut self, now_ms: u64) {
        self.set_now(now_ms);
    }

    fn set_now(&mut self, now_ms: u64) {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
            engine_logging::set_clock_ms(now_ms);
        }
    }
}
