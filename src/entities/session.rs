use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A cookie-backed session row. `sess` is the serialized principal; rows past
/// `expire` are treated as absent and purged opportunistically.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub sid: String,
    pub sess: String,
    pub expire: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
