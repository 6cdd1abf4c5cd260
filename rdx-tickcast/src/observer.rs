//! The capabilities a type implements to receive time updates from a clock.
//!
//! Updates are delivered synchronously on the clock's tick task, so an
//! implementation should return promptly: a slow observer delays every observer
//! after it and the next tick. Returning an error is reported and does not stop
//! the remaining observers from being notified.
//!
//! The registry is locked while a round is delivered, so an observer that wants
//! to register or deregister from inside `update` must spawn that call; it takes
//! effect after the current round.

use crate::common::{TimeSample, Topic};

/// Receives topic-scoped updates from a `TopicClock`.
pub trait TopicObserver: Send + Sync {
    /// Called once per tick for each topic the observer is subscribed to and
    /// that the tick fans out to.
    fn update(&self, topic: Topic, time: TimeSample) -> anyhow::Result<()>;
}

/// Receives every tick from a `SimpleClock`.
pub trait TimeObserver: Send + Sync {
    fn update(&self, time: TimeSample) -> anyhow::Result<()>;
}

impl<F> TopicObserver for F
where
    F: Fn(Topic, TimeSample) -> anyhow::Result<()> + Send + Sync,
{
    fn update(&self, topic: Topic, time: TimeSample) -> anyhow::Result<()> {
        self(topic, time)
    }
}

impl<F> TimeObserver for F
where
    F: Fn(TimeSample) -> anyhow::Result<()> + Send + Sync,
{
    fn update(&self, time: TimeSample) -> anyhow::Result<()> {
        self(time)
    }
}
