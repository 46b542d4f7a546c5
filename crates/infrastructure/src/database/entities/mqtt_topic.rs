use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mqtt_topic")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub qos: i32,
    pub description: Option<String>,
    pub payload_decoder_id: i64,
    pub is_enabled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mqtt_payload_decoder::Entity",
        from = "Column::PayloadDecoderId",
        to = "super::mqtt_payload_decoder::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    PayloadDecoder,
    #[sea_orm(has_many = "super::mqtt_topic_link::Entity")]
    Links,
    #[sea_orm(has_many = "super::mqtt_topic_by_subscriber::Entity")]
    SubscriberLinks,
}

impl Related<super::mqtt_payload_decoder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayloadDecoder.def()
    }
}

impl Related<super::mqtt_topic_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl Related<super::mqtt_topic_by_subscriber::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubscriberLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
