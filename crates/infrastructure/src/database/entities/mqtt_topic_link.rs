use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mqtt_topic_link")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub topic_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub payload_field_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub timeseries_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mqtt_topic::Entity",
        from = "Column::TopicId",
        to = "super::mqtt_topic::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Topic,
    #[sea_orm(
        belongs_to = "super::mqtt_payload_field::Entity",
        from = "Column::PayloadFieldId",
        to = "super::mqtt_payload_field::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    PayloadField,
    #[sea_orm(
        belongs_to = "super::timeseries::Entity",
        from = "Column::TimeseriesId",
        to = "super::timeseries::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Timeseries,
}

impl Related<super::mqtt_topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topic.def()
    }
}

impl Related<super::mqtt_payload_field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayloadField.def()
    }
}

impl Related<super::timeseries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Timeseries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
