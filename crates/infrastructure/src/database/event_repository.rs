use crate::database::entities::event;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use domain::error::DomainError;
use domain::event_repository::EventRepository;
use domain::model::{Event, EventState};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

pub struct SeaOrmEventRepository {
    db: DatabaseConnection,
}

impl SeaOrmEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn to_offset(dt: DateTime<Utc>) -> DateTime<FixedOffset> {
        dt.with_timezone(&FixedOffset::east_opt(0).unwrap())
    }

    fn model_to_event(model: event::Model) -> Result<Event, DomainError> {
        Ok(Event {
            id: Some(model.id),
            category: model.category,
            level: model.level,
            state: Self::state_from_str(&model.state)?,
            source: model.source,
            target_type: model.target_type,
            target_id: model.target_id,
            timestamp_start: model.timestamp_start.with_timezone(&Utc),
            timestamp_end: model.timestamp_end.map(|ts| ts.with_timezone(&Utc)),
            timestamp_last_update: model.timestamp_last_update.with_timezone(&Utc),
            description: model.description,
        })
    }

    fn state_from_str(state: &str) -> Result<EventState, DomainError> {
        match state {
            "NEW" => Ok(EventState::New),
            "ONGOING" => Ok(EventState::Ongoing),
            "CLOSED" => Ok(EventState::Closed),
            other => Err(DomainError::Storage(format!("unknown event state: {other}"))),
        }
    }
}

#[async_trait]
impl EventRepository for SeaOrmEventRepository {
    async fn save(&self, ev: &Event) -> Result<Event, DomainError> {
        let active_model = event::ActiveModel {
            id: sea_orm::NotSet,
            category: Set(ev.category.clone()),
            level: Set(ev.level.clone()),
            state: Set(ev.state.as_str().to_string()),
            source: Set(ev.source.clone()),
            target_type: Set(ev.target_type.clone()),
            target_id: Set(ev.target_id),
            timestamp_start: Set(Self::to_offset(ev.timestamp_start)),
            timestamp_end: Set(ev.timestamp_end.map(Self::to_offset)),
            timestamp_last_update: Set(Self::to_offset(ev.timestamp_last_update)),
            description: Set(ev.description.clone()),
        };

        let result = event::Entity::insert(active_model)
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        let mut saved = ev.clone();
        saved.id = Some(result.last_insert_id);
        Ok(saved)
    }

    async fn update(&self, ev: &Event) -> Result<(), DomainError> {
        let id = ev
            .id
            .ok_or_else(|| DomainError::Storage("cannot update an event without an id".to_string()))?;

        let model = event::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .ok_or_else(|| DomainError::Storage(format!("event {id} not found")))?;

        let mut active_model: event::ActiveModel = model.into();
        active_model.state = Set(ev.state.as_str().to_string());
        active_model.timestamp_end = Set(ev.timestamp_end.map(Self::to_offset));
        active_model.timestamp_last_update = Set(Self::to_offset(ev.timestamp_last_update));
        active_model
            .update(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn list_by_state(
        &self,
        states: &[EventState],
        category: Option<&str>,
        source: Option<&str>,
        level: Option<&str>,
        target_type: Option<&str>,
        target_id: Option<i64>,
    ) -> Result<Vec<Event>, DomainError> {
        let mut query = event::Entity::find();

        if !states.is_empty() {
            let state_strs: Vec<String> =
                states.iter().map(|s| s.as_str().to_string()).collect();
            query = query.filter(event::Column::State.is_in(state_strs));
        }

        let mut filters = Condition::all();
        if let Some(category) = category {
            filters = filters.add(event::Column::Category.eq(category));
        }
        if let Some(source) = source {
            filters = filters.add(event::Column::Source.eq(source));
        }
        if let Some(level) = level {
            filters = filters.add(event::Column::Level.eq(level));
        }
        if let Some(target_type) = target_type {
            filters = filters.add(event::Column::TargetType.eq(target_type));
        }
        if let Some(target_id) = target_id {
            filters = filters.add(event::Column::TargetId.eq(target_id));
        }
        query = query.filter(filters);

        let models = query
            .order_by_asc(event::Column::TimestampStart)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        models.into_iter().map(Self::model_to_event).collect()
    }
}
