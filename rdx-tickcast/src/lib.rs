//! # Tickcast
//!
//! A tick-driven clock that pushes the current time to registered observers.
//!
//! ## Core Concepts
//!
//! - **Clock**: the subject. It owns an observer registry, wakes once per tick
//!   period, samples the wall clock and notifies observers synchronously, in
//!   registration order.
//! - **Topics**: a `TopicClock` scopes subscriptions to `second`, `minute` or
//!   `punctually`. Every tick reaches `second`; exact-minute ticks also reach
//!   `minute`; exact-hour ticks also reach `punctually`. A `SimpleClock` has no
//!   topics and notifies everyone on every tick.
//! - **Observers**: anything implementing `TopicObserver` or `TimeObserver`,
//!   including plain closures. `DigitalClock` prints each update as a line.
//! - **Explicit shutdown**: `Clock::spawn` returns a `ClockHandle`; the loop
//!   runs until the handle is shut down or dropped.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tickcast::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Create the subject from a default configuration.
//!     let clock = TopicClock::new(&ClockConfig::default());
//!
//!     // 2. Register one observer under every topic.
//!     let display = Arc::new(DigitalClock::stdout());
//!     for topic in Topic::ALL {
//!         clock.register(topic, display.clone()).await;
//!     }
//!
//!     // 3. Run until Ctrl+C.
//!     clock.run_until_ctrl_c().await
//! }
//! ```

pub const ENGINE_NAME: &str = "Tickcast";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod observer;
pub mod time;

/// A prelude module for easy importing of the most common Tickcast types.
pub mod prelude {
    pub use crate::common::{ObserverId, TimeSample, Topic};
    pub use crate::components::digital::DigitalClock;
    pub use crate::config::{ClockConfig, ClockVariant, MissedTicks};
    pub use crate::engine::{Clock, ClockHandle, Dispatch, Flat, SimpleClock, TopicClock, Topics};
    pub use crate::events::ClockEvent;
    pub use crate::observer::{TimeObserver, TopicObserver};
    pub use crate::time::{ScriptedTimeSource, SystemTimeSource, TickEvent, Ticker, TimeSource};
}
