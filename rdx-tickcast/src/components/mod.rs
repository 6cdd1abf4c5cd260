//! Contains the building blocks the clock is assembled from.
//!
//! The registry keeps observers in subscription order per key; the digital
//! clock is the stock console observer.

pub mod digital;
pub mod registry;
