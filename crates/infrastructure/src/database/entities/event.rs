use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category: String,
    pub level: String,
    pub state: String,
    pub source: String,
    pub target_type: String,
    pub target_id: i64,
    pub timestamp_start: DateTimeWithTimeZone,
    pub timestamp_end: Option<DateTimeWithTimeZone>,
    pub timestamp_last_update: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event_category::Entity",
        from = "Column::Category",
        to = "super::event_category::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::event_level::Entity",
        from = "Column::Level",
        to = "super::event_level::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Level,
    #[sea_orm(
        belongs_to = "super::event_state::Entity",
        from = "Column::State",
        to = "super::event_state::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    State,
    #[sea_orm(
        belongs_to = "super::event_target::Entity",
        from = "Column::TargetType",
        to = "super::event_target::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Target,
}

impl Related<super::event_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::event_level::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Level.def()
    }
}

impl Related<super::event_state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::State.def()
    }
}

impl Related<super::event_target::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Target.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
