use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "timeseries_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub timeseries_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub timestamp: DateTimeWithTimeZone,
    pub value: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::timeseries::Entity",
        from = "Column::TimeseriesId",
        to = "super::timeseries::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Timeseries,
}

impl Related<super::timeseries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Timeseries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
