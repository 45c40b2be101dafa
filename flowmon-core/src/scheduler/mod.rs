//! Discrete-event scheduling on the simulation's virtual clock.
//!
//! The [`Scheduler`] owns the clock and a queue of due [`Timer`]s. A
//! timer is registered once; every time it fires it tells the scheduler
//! when it wants to fire next. Nothing fires past the configured stop
//! time or after the [`StopSignal`] is toggled.
//!
//! ```
//! # use flowmon_core::{scheduler::{Reschedule, Scheduler, Timer, TimerState}, time::SimTime};
//! # use std::time::Duration;
//! struct Counter(u32);
//!
//! impl Timer for Counter {
//!     fn fire(&mut self, _now: SimTime) -> Reschedule {
//!         self.0 += 1;
//!         Reschedule::After(Duration::from_millis(500))
//!     }
//! }
//!
//! let mut counter = Counter(0);
//! let mut scheduler = Scheduler::new(SimTime::from_secs(3));
//! let id = scheduler.schedule(SimTime::from_secs(2), &mut counter).unwrap();
//!
//! let summary = scheduler.run();
//! assert_eq!(summary.fired, 3); // 2.0, 2.5 and 3.0
//! assert_eq!(scheduler.state(id), Some(TimerState::Stopped));
//! # drop(scheduler);
//! assert_eq!(counter.0, 3);
//! ```

mod stop;
mod time_queue;

use self::time_queue::TimeQueue;
use crate::time::SimTime;
use log::{trace, warn};
use std::time::Duration;
use thiserror::Error;

pub use self::stop::StopSignal;

/// A task driven by the [`Scheduler`].
pub trait Timer {
    /// called when the timer is due, `now` being the current virtual time.
    fn fire(&mut self, now: SimTime) -> Reschedule;
}

/// What a [`Timer`] wants once it has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reschedule {
    /// fire again after the given (non-zero) duration
    After(Duration),
    /// do not fire again
    Done,
}

/// The lifecycle of a registered [`Timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// waiting to fire at the given time
    Scheduled(SimTime),
    /// currently firing
    Running,
    /// will never fire again
    Stopped,
}

/// Handle on a [`Timer`] registered with a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(usize);

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("Cannot schedule a timer at {at}, the clock is already at {now}")]
    InThePast { at: SimTime, now: SimTime },
}

/// What happened during [`Scheduler::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// number of timer invocations
    pub fired: u64,
    /// events dropped because they were due past the stop time
    pub suppressed: u64,
    /// the run ended because of the [`StopSignal`]
    pub halted: bool,
    /// the virtual time when the run ended
    pub end: SimTime,
}

struct Slot<'a> {
    timer: &'a mut dyn Timer,
    state: TimerState,
}

/// Single threaded event loop over the virtual clock.
///
/// Events execute in increasing virtual time; events due at the same
/// time execute in the order they were scheduled.
pub struct Scheduler<'a> {
    now: SimTime,
    stop_at: SimTime,
    stop: StopSignal,

    queue: TimeQueue<TimerId>,
    timers: Vec<Slot<'a>>,

    fired: u64,
    suppressed: u64,
    halted: bool,
}

impl<'a> Scheduler<'a> {
    /// create a scheduler whose clock stops at `stop_at`
    pub fn new(stop_at: SimTime) -> Self {
        Self::with_stop_signal(stop_at, StopSignal::new())
    }

    /// same as [`Scheduler::new`] but observing an existing [`StopSignal`]
    pub fn with_stop_signal(stop_at: SimTime, stop: StopSignal) -> Self {
        Self {
            now: SimTime::ZERO,
            stop_at,
            stop,
            queue: TimeQueue::new(),
            timers: Vec::new(),
            fired: 0,
            suppressed: 0,
            halted: false,
        }
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    #[inline]
    pub fn stop_at(&self) -> SimTime {
        self.stop_at
    }

    /// a handle on the signal that halts this scheduler
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// number of events waiting to fire
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn state(&self, id: TimerId) -> Option<TimerState> {
        self.timers.get(id.0).map(|slot| slot.state)
    }

    /// register `timer` to fire first at `at`.
    ///
    /// A timer due past the stop time is registered as
    /// [`TimerState::Stopped`] and never fires.
    ///
    /// # Errors
    ///
    /// [`TimerError::InThePast`] if `at` is before the current time.
    pub fn schedule(&mut self, at: SimTime, timer: &'a mut dyn Timer) -> Result<TimerId, TimerError> {
        if at < self.now {
            return Err(TimerError::InThePast { at, now: self.now });
        }

        let id = TimerId(self.timers.len());
        let state = if at > self.stop_at {
            trace!("timer {id:?} due at {at} is past the stop time ({})", self.stop_at);
            self.suppressed += 1;
            TimerState::Stopped
        } else {
            self.queue.push(at, id);
            TimerState::Scheduled(at)
        };

        self.timers.push(Slot { timer, state });
        Ok(id)
    }

    /// fire the next due timer.
    ///
    /// Returns `None` once there is nothing left to fire before the stop
    /// time, or when the [`StopSignal`] was toggled. Every timer is then
    /// [`TimerState::Stopped`].
    pub fn step(&mut self) -> Option<TimerId> {
        if self.stop.get() {
            self.halted = true;
            self.stop_all();
            return None;
        }

        let due = self.queue.time_to_next()?;
        if due > self.stop_at {
            self.stop_all();
            return None;
        }
        let (due, id) = self.queue.pop()?;

        self.now = due;
        let slot = &mut self.timers[id.0];
        slot.state = TimerState::Running;
        let reschedule = slot.timer.fire(due);
        self.fired += 1;

        let state = match reschedule {
            Reschedule::Done => TimerState::Stopped,
            Reschedule::After(period) if period.is_zero() => {
                warn!("timer {id:?} asked to be rescheduled without delay, stopping it");
                TimerState::Stopped
            }
            Reschedule::After(period) => match due.checked_add(period) {
                Some(next) if next <= self.stop_at => {
                    self.queue.push(next, id);
                    TimerState::Scheduled(next)
                }
                _ => {
                    trace!("timer {id:?} not rescheduled past the stop time ({})", self.stop_at);
                    self.suppressed += 1;
                    TimerState::Stopped
                }
            },
        };
        self.timers[id.0].state = state;

        Some(id)
    }

    /// fire every due timer until the stop time or the stop signal.
    pub fn run(&mut self) -> RunSummary {
        while self.step().is_some() {}

        RunSummary {
            fired: self.fired,
            suppressed: self.suppressed,
            halted: self.halted,
            end: self.now,
        }
    }

    fn stop_all(&mut self) {
        while let Some((due, id)) = self.queue.pop() {
            trace!("timer {id:?} due at {due} suppressed");
            self.suppressed += 1;
        }
        for slot in &mut self.timers {
            slot.state = TimerState::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// records every time it fires
    #[derive(Default)]
    struct Recorder {
        fired: Vec<SimTime>,
        period: Option<Duration>,
        stop: Option<(StopSignal, usize)>,
    }

    impl Recorder {
        fn every(period: Duration) -> Self {
            Self {
                period: Some(period),
                ..Self::default()
            }
        }
    }

    impl Timer for Recorder {
        fn fire(&mut self, now: SimTime) -> Reschedule {
            self.fired.push(now);
            if let Some((stop, after)) = &self.stop {
                if self.fired.len() == *after {
                    stop.toggle();
                }
            }
            match self.period {
                Some(period) => Reschedule::After(period),
                None => Reschedule::Done,
            }
        }
    }

    #[test]
    fn one_shot() {
        let mut timer = Recorder::default();
        let mut scheduler = Scheduler::new(SimTime::from_secs(10));
        let id = scheduler.schedule(SimTime::from_secs(1), &mut timer).unwrap();

        assert_eq!(scheduler.state(id), Some(TimerState::Scheduled(SimTime::from_secs(1))));
        assert_eq!(scheduler.step(), Some(id));
        assert_eq!(scheduler.state(id), Some(TimerState::Stopped));
        assert_eq!(scheduler.step(), None);
        assert_eq!(scheduler.now(), SimTime::from_secs(1));

        drop(scheduler);
        assert_eq!(timer.fired, vec![SimTime::from_secs(1)]);
    }

    #[test]
    fn recurring_until_stop_time() {
        let mut timer = Recorder::every(Duration::from_millis(500));
        let mut scheduler = Scheduler::new(SimTime::from_secs(4));
        scheduler.schedule(SimTime::from_secs(2), &mut timer).unwrap();

        let summary = scheduler.run();

        assert_eq!(summary.fired, 5);
        assert_eq!(summary.suppressed, 1);
        assert!(!summary.halted);
        assert_eq!(summary.end, SimTime::from_secs(4));
        assert_eq!(scheduler.pending(), 0);

        drop(scheduler);
        let expected: Vec<_> = [2_000, 2_500, 3_000, 3_500, 4_000]
            .into_iter()
            .map(SimTime::from_millis)
            .collect();
        assert_eq!(timer.fired, expected);
    }

    #[test]
    fn strictly_increasing_time() {
        let mut fast = Recorder::every(Duration::from_millis(300));
        let mut slow = Recorder::every(Duration::from_millis(700));
        let mut scheduler = Scheduler::new(SimTime::from_secs(5));
        scheduler.schedule(SimTime::ZERO, &mut fast).unwrap();
        scheduler.schedule(SimTime::from_millis(100), &mut slow).unwrap();

        let mut last = SimTime::ZERO;
        while scheduler.step().is_some() {
            assert!(scheduler.now() >= last);
            last = scheduler.now();
        }

        drop(scheduler);
        assert!(fast.fired.windows(2).all(|w| w[0] < w[1]));
        assert!(slow.fired.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(slow.fired.len(), 8);
    }

    #[test]
    fn past_stop_is_suppressed() {
        let mut timer = Recorder::default();
        let mut scheduler = Scheduler::new(SimTime::from_secs(1));
        let id = scheduler.schedule(SimTime::from_secs(2), &mut timer).unwrap();

        assert_eq!(scheduler.state(id), Some(TimerState::Stopped));
        let summary = scheduler.run();
        assert_eq!(summary.fired, 0);
        assert_eq!(summary.suppressed, 1);

        drop(scheduler);
        assert!(timer.fired.is_empty());
    }

    #[test]
    fn schedule_in_the_past() {
        let mut first = Recorder::default();
        let mut second = Recorder::default();
        let mut scheduler = Scheduler::new(SimTime::from_secs(10));
        scheduler.schedule(SimTime::from_secs(5), &mut first).unwrap();
        scheduler.run();

        assert!(matches!(
            scheduler.schedule(SimTime::from_secs(1), &mut second),
            Err(TimerError::InThePast { .. })
        ));
    }

    #[test]
    fn stop_signal_halts() {
        let mut timer = Recorder::every(Duration::from_secs(1));
        let mut scheduler = Scheduler::new(SimTime::from_secs(100));
        timer.stop = Some((scheduler.stop_signal(), 3));
        let id = scheduler.schedule(SimTime::ZERO, &mut timer).unwrap();

        let summary = scheduler.run();

        assert!(summary.halted);
        assert_eq!(summary.fired, 3);
        assert_eq!(summary.end, SimTime::from_secs(2));
        assert_eq!(scheduler.state(id), Some(TimerState::Stopped));
    }

    #[test]
    fn zero_period_stops_the_timer() {
        let mut timer = Recorder::every(Duration::ZERO);
        let mut scheduler = Scheduler::new(SimTime::from_secs(1));
        let id = scheduler.schedule(SimTime::ZERO, &mut timer).unwrap();

        let summary = scheduler.run();
        assert_eq!(summary.fired, 1);
        assert_eq!(scheduler.state(id), Some(TimerState::Stopped));
    }
}
