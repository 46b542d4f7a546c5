//! Event Engine (`spec.md` §4.4).
//!
//! Thin orchestration tying `domain::Event`'s state-machine methods to
//! `EventRepository` persistence. Mirrors how `TagExecutor` wraps
//! `Tag`'s mutating methods around a publisher; here the "publisher" is
//! the repository itself.

use chrono::{DateTime, Utc};

use domain::error::{DomainError, EventError};
use domain::event_repository::EventRepository;
use domain::model::{Event, EventState};

/// Opens a new event and persists it (`spec.md` §4.4 `open`).
#[allow(clippy::too_many_arguments)]
pub async fn open(
    repository: &dyn EventRepository,
    category: impl Into<String>,
    source: impl Into<String>,
    target_type: impl Into<String>,
    target_id: i64,
    level: impl Into<String>,
    timestamp_start: Option<DateTime<Utc>>,
    description: Option<String>,
    now: DateTime<Utc>,
) -> Result<Event, DomainError> {
    let event = Event::open(
        category,
        source,
        target_type,
        target_id,
        level,
        timestamp_start,
        description,
        now,
    );
    repository.save(&event).await
}

/// Extends an existing event and persists the new state
/// (`spec.md` §4.4 `extend`). Fails without touching storage if the event
/// is already `CLOSED`.
pub async fn extend(
    repository: &dyn EventRepository,
    mut event: Event,
    now: DateTime<Utc>,
) -> Result<Event, EventEngineError> {
    event.extend(now).map_err(EventEngineError::Event)?;
    repository
        .update(&event)
        .await
        .map_err(EventEngineError::Domain)?;
    Ok(event)
}

/// Closes an existing event and persists the new state
/// (`spec.md` §4.4 `close`). Idempotent: closing an already-`CLOSED` event
/// is a no-op that still round-trips through the repository.
pub async fn close(
    repository: &dyn EventRepository,
    mut event: Event,
    timestamp_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Event, DomainError> {
    event.close(timestamp_end, now);
    repository.update(&event).await?;
    Ok(event)
}

/// `spec.md` §4.4 `list_by_state`: requires at least one state.
pub async fn list_by_state(
    repository: &dyn EventRepository,
    states: &[EventState],
    category: Option<&str>,
    source: Option<&str>,
    level: Option<&str>,
    target_type: Option<&str>,
    target_id: Option<i64>,
) -> Result<Vec<Event>, EventEngineError> {
    if states.is_empty() {
        return Err(EventEngineError::Event(EventError::MissingStateFilter));
    }
    repository
        .list_by_state(states, category, source, level, target_type, target_id)
        .await
        .map_err(EventEngineError::Domain)
}

#[derive(thiserror::Error, Debug)]
pub enum EventEngineError {
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::event_repository::MockEventRepository;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[tokio::test]
    async fn test_open_persists_new_event() {
        let mut repo = MockEventRepository::new();
        repo.expect_save().returning(|event| {
            let mut saved = event.clone();
            saved.id = Some(1);
            Ok(saved)
        });

        let saved = open(
            &repo,
            "observation_missing",
            "acquisition",
            "TIMESERIES",
            42,
            "ERROR",
            None,
            None,
            now(),
        )
        .await
        .unwrap();
        assert_eq!(saved.id, Some(1));
        assert_eq!(saved.state, EventState::New);
    }

    #[tokio::test]
    async fn test_extend_closed_event_fails_without_touching_storage() {
        let mut repo = MockEventRepository::new();
        repo.expect_update().times(0);

        let mut event = Event::open("c", "s", "TIMESERIES", 1, "ERROR", None, None, now());
        event.close(None, now());

        let err = extend(&repo, event, now()).await.unwrap_err();
        assert!(matches!(err, EventEngineError::Event(EventError::ExtendClosed)));
    }

    #[tokio::test]
    async fn test_list_by_state_requires_states() {
        let repo = MockEventRepository::new();
        let err = list_by_state(&repo, &[], None, None, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EventEngineError::Event(EventError::MissingStateFilter)
        ));
    }
}
