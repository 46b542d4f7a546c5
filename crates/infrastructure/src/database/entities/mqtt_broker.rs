use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mqtt_broker")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub host: String,
    pub port: i32,
    pub protocol_version: String,
    pub transport: String,
    pub is_auth_required: bool,
    pub use_tls: bool,
    pub tls_version: Option<String>,
    pub tls_verifymode: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub tls_certificate: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::mqtt_subscriber::Entity")]
    Subscribers,
}

impl Related<super::mqtt_subscriber::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscribers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
