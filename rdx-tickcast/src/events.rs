//! Defines the lifecycle events broadcast by a clock.
//!
//! Subscribers receive these alongside, not instead of, observer updates. They
//! are meant for monitoring: a lagging subscriber misses events but never slows
//! the tick loop down.

use crate::common::ObserverId;
use tokio::time::Instant;

/// Events about the clock itself and its registry. `K` is the registry key:
/// `Topic` for a topic clock, `()` for a simple one.
#[derive(Debug, Clone)]
pub enum ClockEvent<K> {
    /// Fired once when the tick loop begins.
    Started { timestamp: Instant },
    /// Fired once when the tick loop exits.
    Shutdown,
    /// Fired when an observer gains a subscription.
    ObserverAdded { id: ObserverId, key: K },
    /// Fired when an observer loses a subscription.
    ObserverRemoved { id: ObserverId, key: K },
    /// Fired when an observer's update returned an error. The round continued.
    ObserverFailed {
        id: ObserverId,
        key: K,
        error: String,
    },
}
