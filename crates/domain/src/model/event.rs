use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Event lifecycle state (`spec.md` §4.4).
///
/// Unlike `EventCategory`/`EventLevel`/`EventTarget` (modeled as open-ended,
/// seeded lookup rows — see `DESIGN.md` Open Question #2), `state` is a
/// closed three-value machine and is represented as a Rust enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventState {
    New,
    Ongoing,
    Closed,
}

impl EventState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Ongoing => "ONGOING",
            Self::Closed => "CLOSED",
        }
    }
}

/// A typed, time-bounded record of an operational anomaly, with an explicit
/// `NEW -> ONGOING -> CLOSED` state machine (`spec.md` §4.4, GLOSSARY).
///
/// `category`, `level`, and `target_type` are free-form ids resolved against
/// the seeded lookup tables (`event_category`, `event_level`, `event_target`)
/// at the storage layer; the domain does not constrain their values, since
/// the original source seeds but does not close the set (Open Question #2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Option<i64>,
    pub category: String,
    pub level: String,
    pub state: EventState,
    pub source: String,
    pub target_type: String,
    pub target_id: i64,
    pub timestamp_start: DateTime<Utc>,
    pub timestamp_end: Option<DateTime<Utc>>,
    pub timestamp_last_update: DateTime<Utc>,
    pub description: Option<String>,
}

impl Event {
    /// Creates a NEW event (`spec.md` §4.4 `open`).
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        category: impl Into<String>,
        source: impl Into<String>,
        target_type: impl Into<String>,
        target_id: i64,
        level: impl Into<String>,
        timestamp_start: Option<DateTime<Utc>>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let timestamp_start = timestamp_start.unwrap_or(now);
        Self {
            id: None,
            category: category.into(),
            level: level.into(),
            state: EventState::New,
            source: source.into(),
            target_type: target_type.into(),
            target_id,
            timestamp_start,
            timestamp_end: None,
            timestamp_last_update: now,
            description,
        }
    }

    /// `spec.md` §4.4 `extend`: NEW -> ONGOING or ONGOING -> ONGOING; fails
    /// from CLOSED.
    pub fn extend(&mut self, now: DateTime<Utc>) -> Result<(), EventError> {
        if matches!(self.state, EventState::Closed) {
            return Err(EventError::ExtendClosed);
        }
        self.state = EventState::Ongoing;
        self.timestamp_last_update = now;
        Ok(())
    }

    /// `spec.md` §4.4 `close`: any -> CLOSED; no-op if already CLOSED.
    pub fn close(&mut self, timestamp_end: Option<DateTime<Utc>>, now: DateTime<Utc>) {
        if matches!(self.state, EventState::Closed) {
            return;
        }
        self.state = EventState::Closed;
        let ts_end = timestamp_end.unwrap_or(now);
        self.timestamp_end = Some(ts_end);
        self.timestamp_last_update = ts_end;
    }

    /// `spec.md` §4.4 `duration`: `timestamp_end - timestamp_start` if
    /// CLOSED, else `timestamp_last_update - timestamp_start`.
    pub fn duration(&self) -> chrono::Duration {
        match self.timestamp_end {
            Some(end) => end - self.timestamp_start,
            None => self.timestamp_last_update - self.timestamp_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_open_is_new() {
        let evt = Event::open(
            "observation_missing",
            "acquisition",
            "TIMESERIES",
            42,
            "ERROR",
            None,
            None,
            now(),
        );
        assert_eq!(evt.state, EventState::New);
        assert_eq!(evt.duration(), Duration::zero());
    }

    #[test]
    fn test_extend_new_to_ongoing() {
        let mut evt = Event::open(
            "observation_missing",
            "acquisition",
            "TIMESERIES",
            42,
            "ERROR",
            None,
            None,
            now(),
        );
        let t1 = now() + Duration::seconds(5);
        evt.extend(t1).unwrap();
        assert_eq!(evt.state, EventState::Ongoing);
        assert_eq!(evt.duration(), Duration::seconds(5));
    }

    #[test]
    fn test_extend_ongoing_stays_ongoing() {
        let mut evt = Event::open(
            "c",
            "s",
            "TIMESERIES",
            1,
            "ERROR",
            None,
            None,
            now(),
        );
        evt.extend(now() + Duration::seconds(1)).unwrap();
        evt.extend(now() + Duration::seconds(2)).unwrap();
        assert_eq!(evt.state, EventState::Ongoing);
    }

    #[test]
    fn test_close_sets_timestamps() {
        let mut evt = Event::open("c", "s", "TIMESERIES", 1, "ERROR", None, None, now());
        let t_end = now() + Duration::seconds(10);
        evt.close(None, t_end);
        assert_eq!(evt.state, EventState::Closed);
        assert_eq!(evt.timestamp_end, Some(t_end));
        assert_eq!(evt.timestamp_last_update, t_end);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut evt = Event::open("c", "s", "TIMESERIES", 1, "ERROR", None, None, now());
        evt.close(None, now() + Duration::seconds(10));
        let first_close = evt.clone();
        evt.close(None, now() + Duration::seconds(999));
        assert_eq!(evt, first_close);
    }

    #[test]
    fn test_extend_after_close_fails() {
        let mut evt = Event::open("c", "s", "TIMESERIES", 1, "ERROR", None, None, now());
        evt.close(None, now() + Duration::seconds(1));
        let err = evt.extend(now() + Duration::seconds(2)).unwrap_err();
        assert_eq!(err, EventError::ExtendClosed);
    }

    #[test]
    fn test_duration_non_negative_while_open() {
        let evt = Event::open("c", "s", "TIMESERIES", 1, "ERROR", None, None, now());
        assert!(evt.duration() >= Duration::zero());
    }

    #[test]
    fn test_event_lifecycle_scenario() {
        // Literal scenario 1 from spec.md §8.
        let t0 = now();
        let mut evt = Event::open(
            "observation_missing",
            "src",
            "TIMESERIES",
            42,
            "ERROR",
            None,
            None,
            t0,
        );
        assert_eq!(evt.state, EventState::New);
        assert_eq!(evt.duration(), Duration::zero());

        let t1 = t0 + Duration::seconds(30);
        evt.extend(t1).unwrap();
        assert_eq!(evt.state, EventState::Ongoing);
        assert!(evt.duration() > Duration::zero());

        let t2 = t1 + Duration::seconds(5);
        evt.close(None, t2);
        assert_eq!(evt.state, EventState::Closed);
        assert_eq!(evt.timestamp_end, Some(t2));
        assert_eq!(evt.timestamp_last_update, evt.timestamp_end.unwrap());

        assert!(evt.extend(t2 + Duration::seconds(1)).is_err());
    }
}
