pub use sea_orm_migration::prelude::*;

mod m20240115_000001_create_pagos_table;
mod m20240115_000002_create_pago_items_table;
mod m20240302_000003_add_proveedor_and_split_dates;
mod m20240330_000004_tighten_pagos_constraints;
mod m20240412_000005_add_moneda;
mod m20240425_000006_flatten_pago_items;
mod m20240509_000007_add_archivos;
mod m20240530_000008_add_op;
mod m20240614_000009_create_usuarios_table;
mod m20240614_000010_create_session_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240115_000001_create_pagos_table::Migration),
            Box::new(m20240115_000002_create_pago_items_table::Migration),
            Box::new(m20240302_000003_add_proveedor_and_split_dates::Migration),
            Box::new(m20240330_000004_tighten_pagos_constraints::Migration),
            Box::new(m20240412_000005_add_moneda::Migration),
            Box::new(m20240425_000006_flatten_pago_items::Migration),
            Box::new(m20240509_000007_add_archivos::Migration),
            Box::new(m20240530_000008_add_op::Migration),
            Box::new(m20240614_000009_create_usuarios_table::Migration),
            Box::new(m20240614_000010_create_session_table::Migration),
        ]
    }
}
