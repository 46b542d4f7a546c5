use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mqtt_subscriber")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub broker_id: i64,
    pub is_enabled: bool,
    pub keep_alive: i32,
    pub use_persistent_session: bool,
    pub session_expiry: i32,
    pub username: Option<String>,
    pub password: Option<String>,
    pub is_connected: bool,
    pub timestamp_last_connection: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mqtt_broker::Entity",
        from = "Column::BrokerId",
        to = "super::mqtt_broker::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Broker,
}

impl Related<super::mqtt_broker::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Broker.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
