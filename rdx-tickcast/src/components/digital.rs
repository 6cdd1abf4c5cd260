//! A console observer that prints the time it is told.

use crate::common::{TimeSample, Topic};
use crate::observer::{TimeObserver, TopicObserver};
use anyhow::Context;
use std::io::{self, Stdout, Write};
use std::sync::{Mutex, PoisonError};

/// Renders time updates as one line of text each.
///
/// Writes to stdout by default; any `Write` sink can be plugged in instead.
pub struct DigitalClock<W = Stdout> {
    out: Mutex<W>,
}

impl DigitalClock<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Default for DigitalClock<Stdout> {
    fn default() -> Self {
        Self::stdout()
    }
}

impl<W: Write> DigitalClock<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Gives the sink back, e.g. to inspect what was written.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, line: &str) -> anyhow::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}").context("digital clock failed to write")?;
        out.flush().context("digital clock failed to flush")
    }
}

/// The line printed for `time` under `topic`.
pub fn render(topic: Topic, time: TimeSample) -> String {
    match topic {
        Topic::Second => render_full(time),
        Topic::Minute => format!("Current time: {}h {}m sharp", time.hours, time.minutes),
        Topic::Punctually => format!("Current time: {} o'clock", time.hours),
    }
}

/// The line printed for an unscoped update.
pub fn render_full(time: TimeSample) -> String {
    format!(
        "Current time: {}h {}m {}s",
        time.hours, time.minutes, time.seconds
    )
}

impl<W: Write + Send> TopicObserver for DigitalClock<W> {
    fn update(&self, topic: Topic, time: TimeSample) -> anyhow::Result<()> {
        self.emit(&render(topic, time))
    }
}

impl<W: Write + Send> TimeObserver for DigitalClock<W> {
    fn update(&self, time: TimeSample) -> anyhow::Result<()> {
        self.emit(&render_full(time))
    }
}
