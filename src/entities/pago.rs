use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A payment record. One row per (expense, location) pair: an expense split
/// across N locations produces N rows, each carrying total / N.
///
/// `fecha` and the nullable concepto/importe survive from earlier schema
/// generations; the current write path always fills the newer columns.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pagos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub local: String,
    pub proveedor: String,
    pub fecha_pago: Date,
    pub fecha_servicio: Date,
    /// Legacy single-date column, read as a fallback only.
    pub fecha: Option<Date>,
    pub moneda: String,
    pub concepto: Option<String>,
    pub importe: Option<f64>,
    pub observacion: Option<String>,
    pub op: Option<String>,
    /// JSON array of uploaded attachments, `[]` when none.
    pub archivos: String,
    pub usuario_registro: String,
    pub fecha_registro: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pago_item::Entity")]
    PagoItem,
}

impl Related<super::pago_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PagoItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
