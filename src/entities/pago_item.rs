use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Deprecated line-item child of a payment record. Historical rows only: the
/// current write path never inserts here, read paths merge them into the
/// normalized view.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pago_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub pago_id: i32,
    pub concepto: String,
    pub importe: f64,
    pub observacion: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pago::Entity",
        from = "Column::PagoId",
        to = "super::pago::Column::Id",
        on_delete = "Cascade"
    )]
    Pago,
}

impl Related<super::pago::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pago.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
