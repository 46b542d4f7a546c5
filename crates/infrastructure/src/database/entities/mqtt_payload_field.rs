use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mqtt_payload_field")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub payload_decoder_id: i64,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mqtt_payload_decoder::Entity",
        from = "Column::PayloadDecoderId",
        to = "super::mqtt_payload_decoder::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    PayloadDecoder,
}

impl Related<super::mqtt_payload_decoder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayloadDecoder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
