use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::Event;

/// Persistence for the `Event` lifecycle (`spec.md` §4.4).
///
/// Mirrors `TagRepository`'s shape: a thin, storage-agnostic contract
/// implemented in the infrastructure crate.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a NEW event and return it with its assigned id.
    async fn save(&self, event: &Event) -> Result<Event, DomainError>;

    /// Persist an updated (extended/closed) event.
    async fn update(&self, event: &Event) -> Result<(), DomainError>;

    /// `spec.md` §4.4 `list_by_state`: OR of `states`, AND of the non-null
    /// filters.
    #[allow(clippy::too_many_arguments)]
    async fn list_by_state(
        &self,
        states: &[crate::model::EventState],
        category: Option<&str>,
        source: Option<&str>,
        level: Option<&str>,
        target_type: Option<&str>,
        target_id: Option<i64>,
    ) -> Result<Vec<Event>, DomainError>;
}
