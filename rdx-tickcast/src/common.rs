//! Contains common, primitive types shared by every part of the clock.
//!
//! This module defines the observer key type, the enumerated notification
//! topics, and the time sample handed to observers on each tick.

use chrono::{NaiveTime, Timelike};
use serde::Deserialize;
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely identifies an observer registered with a clock.
    ///
    /// The same observer registered under several topics keeps a single id.
    /// Keys are never reused, so a stale id can only ever miss.
    pub struct ObserverId;
}

/// A named category of notification an observer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Fired on every tick.
    Second,
    /// Fired on ticks where the seconds are zero.
    Minute,
    /// Fired on ticks where both seconds and minutes are zero.
    Punctually,
}

impl Topic {
    /// Every topic, in fan-out order.
    pub const ALL: [Topic; 3] = [Topic::Second, Topic::Minute, Topic::Punctually];

    /// The wire name of the topic.
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Second => "second",
            Topic::Minute => "minute",
            Topic::Punctually => "punctually",
        }
    }

    /// Looks a topic up by name, ignoring surrounding whitespace and case.
    pub fn from_name(name: &str) -> Option<Topic> {
        let name = name.trim();
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str().eq_ignore_ascii_case(name))
    }

    /// The topics a tick at `sample` fans out to, in notification order.
    ///
    /// Exact-hour ticks are a subset of exact-minute ticks, which are a subset
    /// of all ticks.
    pub fn cascade(sample: TimeSample) -> Vec<Topic> {
        let mut topics = vec![Topic::Second];
        if sample.seconds == 0 {
            topics.push(Topic::Minute);
            if sample.minutes == 0 {
                topics.push(Topic::Punctually);
            }
        }
        topics
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The wall-clock reading taken at a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSample {
    /// 0-23
    pub hours: u32,
    /// 0-59
    pub minutes: u32,
    /// 0-59
    pub seconds: u32,
}

impl TimeSample {
    /// Builds a sample, returning `None` when any component is out of range.
    pub fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        (hours < 24 && minutes < 60 && seconds < 60).then_some(Self {
            hours,
            minutes,
            seconds,
        })
    }

    /// Reads hours, minutes and seconds out of any chrono time value.
    ///
    /// A leap second reads as second 59.
    pub fn of<T: Timelike>(time: &T) -> Self {
        Self {
            hours: time.hour(),
            minutes: time.minute(),
            seconds: time.second().min(59),
        }
    }
}

impl From<NaiveTime> for TimeSample {
    fn from(time: NaiveTime) -> Self {
        Self::of(&time)
    }
}

impl fmt::Display for TimeSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> TimeSample {
        TimeSample::from_hms(h, m, s).unwrap()
    }

    #[test]
    fn cascade_follows_thresholds() {
        assert_eq!(Topic::cascade(at(10, 15, 30)), vec![Topic::Second]);
        assert_eq!(
            Topic::cascade(at(10, 5, 0)),
            vec![Topic::Second, Topic::Minute]
        );
        assert_eq!(
            Topic::cascade(at(10, 0, 0)),
            vec![Topic::Second, Topic::Minute, Topic::Punctually]
        );
        // Minutes are only checked on exact-minute ticks.
        assert_eq!(Topic::cascade(at(10, 0, 1)), vec![Topic::Second]);
    }

    #[test]
    fn topic_names() {
        assert_eq!(Topic::from_name("second"), Some(Topic::Second));
        assert_eq!(Topic::from_name(" Punctually "), Some(Topic::Punctually));
        assert_eq!(Topic::from_name("hourly"), None);
        assert_eq!(Topic::Minute.to_string(), "minute");
    }

    #[test]
    fn sample_bounds() {
        assert!(TimeSample::from_hms(23, 59, 59).is_some());
        assert!(TimeSample::from_hms(24, 0, 0).is_none());
        assert!(TimeSample::from_hms(0, 60, 0).is_none());
        assert!(TimeSample::from_hms(0, 0, 60).is_none());
    }

    #[test]
    fn sample_from_chrono() {
        let time = NaiveTime::from_hms_opt(7, 8, 9).unwrap();
        assert_eq!(TimeSample::from(time), at(7, 8, 9));
        assert_eq!(at(7, 8, 9).to_string(), "07:08:09");
    }
}
