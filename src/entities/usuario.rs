use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A login credential. Rows are seeded by migration from the retired
/// hardcoded user list; at runtime only `ultimo_acceso` changes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string; never plaintext.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub rol: String,
    pub activo: bool,
    pub fecha_creacion: DateTime,
    pub ultimo_acceso: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
