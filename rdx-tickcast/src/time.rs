//! The clock's notion of time: where samples come from and what paces the ticks.

use crate::common::TimeSample;
use crate::config::{ClockConfig, MissedTicks};
use chrono::{Local, Utc};
use chrono_tz::Tz;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval};

/// Produces the wall-clock sample for a tick.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> TimeSample;
}

/// Reads the system clock, either in the host's local timezone or a named one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource {
    timezone: Option<Tz>,
}

impl SystemTimeSource {
    /// Samples in the host's local timezone.
    pub fn local() -> Self {
        Self { timezone: None }
    }

    /// Samples in the given IANA timezone.
    pub fn in_timezone(timezone: Tz) -> Self {
        Self {
            timezone: Some(timezone),
        }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        Self {
            timezone: config.timezone,
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> TimeSample {
        match self.timezone {
            Some(tz) => TimeSample::of(&Utc::now().with_timezone(&tz)),
            None => TimeSample::of(&Local::now()),
        }
    }
}

/// Replays a fixed sequence of samples, then keeps returning the last one.
///
/// Useful for simulating a clock across minute and hour boundaries without
/// waiting for them.
#[derive(Debug)]
pub struct ScriptedTimeSource {
    script: Mutex<Script>,
}

#[derive(Debug)]
struct Script {
    pending: VecDeque<TimeSample>,
    last: TimeSample,
}

impl ScriptedTimeSource {
    /// Creates a source from `samples`. An empty script reads midnight forever.
    pub fn new(samples: impl IntoIterator<Item = TimeSample>) -> Self {
        let pending: VecDeque<_> = samples.into_iter().collect();
        let last = pending.front().copied().unwrap_or(TimeSample {
            hours: 0,
            minutes: 0,
            seconds: 0,
        });
        Self {
            script: Mutex::new(Script { pending, last }),
        }
    }

    /// How many scripted samples have not been read yet.
    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }
}

impl TimeSource for ScriptedTimeSource {
    fn now(&self) -> TimeSample {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(next) = script.pending.pop_front() {
            script.last = next;
        }
        script.last
    }
}

/// Paces the tick loop.
///
/// The first tick fires one full period after the ticker starts, so the loop
/// waits before its first sample.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    period: Duration,
    missed: MissedTicks,
}

impl Ticker {
    pub fn new(period: Duration, missed: MissedTicks) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            missed,
        }
    }

    pub fn from_config(config: &ClockConfig) -> Self {
        Self::new(config.tick_interval(), config.missed_ticks)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts a tokio interval for this ticker, anchored at the current instant.
    pub(crate) fn start(&self) -> Interval {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(self.missed.into());
        interval
    }
}

/// Broadcast after every completed notification round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// Number of rounds completed since the clock was created, starting at 1.
    pub tick_count: u64,
    /// The sample the round was dispatched with.
    pub sample: TimeSample,
}
