use sea_orm_migration::{
    prelude::*,
    sea_orm::{DatabaseBackend, TransactionTrait},
};

use super::m20240302_000003_add_proveedor_and_split_dates::PROVEEDOR_PLACEHOLDER;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240330_000004_tighten_pagos_constraints"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Constraints cannot be tightened in place on SQLite, so the table is
        // rebuilt: create the replacement, copy rows substituting placeholders
        // for required fields that are still null, drop, rename. The whole
        // sequence runs in one transaction so an interruption can never leave
        // the store without a pagos table.
        //
        // pago_items hangs off pagos with ON DELETE CASCADE, and SQLite runs
        // an implicit DELETE when the parent is dropped (Postgres refuses the
        // drop outright). The child rows are parked in a plain backup table,
        // the child dropped first, and both recreated after the rename.
        //
        // The legacy `fecha` column is carried over nullable: display code
        // still reads it as a fallback for rows written before the dates
        // split.
        let backend = manager.get_database_backend();
        let (id_column, today) = match backend {
            DatabaseBackend::Postgres => ("INTEGER GENERATED BY DEFAULT AS IDENTITY", "CURRENT_DATE"),
            _ => ("INTEGER", "date('now')"),
        };

        let create_replacement = format!(
            "CREATE TABLE pagos_new (
                id {id_column} PRIMARY KEY,
                local TEXT NOT NULL,
                proveedor TEXT NOT NULL,
                fecha_pago DATE NOT NULL,
                fecha_servicio DATE NOT NULL,
                fecha DATE,
                usuario_registro TEXT NOT NULL,
                fecha_registro TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"
        );
        let copy_rows = format!(
            "INSERT INTO pagos_new (id, local, proveedor, fecha_pago, fecha_servicio, fecha, usuario_registro, fecha_registro)
             SELECT
                 id,
                 local,
                 COALESCE(proveedor, '{PROVEEDOR_PLACEHOLDER}'),
                 COALESCE(fecha_pago, fecha, {today}),
                 COALESCE(fecha_servicio, fecha, {today}),
                 fecha,
                 usuario_registro,
                 fecha_registro
             FROM pagos"
        );
        let recreate_items = format!(
            "CREATE TABLE pago_items (
                id {id_column} PRIMARY KEY,
                pago_id INTEGER NOT NULL REFERENCES pagos(id) ON DELETE CASCADE,
                concepto TEXT NOT NULL,
                importe DOUBLE PRECISION NOT NULL,
                observacion TEXT
            )"
        );

        let txn = manager.get_connection().begin().await?;

        txn.execute_unprepared("CREATE TABLE pago_items_backup AS SELECT * FROM pago_items")
            .await?;
        txn.execute_unprepared("DROP TABLE pago_items").await?;

        txn.execute_unprepared(&create_replacement).await?;
        txn.execute_unprepared(&copy_rows).await?;
        txn.execute_unprepared("DROP TABLE pagos").await?;
        txn.execute_unprepared("ALTER TABLE pagos_new RENAME TO pagos")
            .await?;

        txn.execute_unprepared(&recreate_items).await?;
        txn.execute_unprepared(
            "INSERT INTO pago_items (id, pago_id, concepto, importe, observacion)
             SELECT id, pago_id, concepto, importe, observacion FROM pago_items_backup",
        )
        .await?;
        txn.execute_unprepared("DROP TABLE pago_items_backup").await?;

        if backend == DatabaseBackend::Postgres {
            // The identity sequences do not follow copied ids.
            txn.execute_unprepared(
                "SELECT setval(pg_get_serial_sequence('pagos', 'id'), COALESCE((SELECT MAX(id) FROM pagos), 1))",
            )
            .await?;
            txn.execute_unprepared(
                "SELECT setval(pg_get_serial_sequence('pago_items', 'id'), COALESCE((SELECT MAX(id) FROM pago_items), 1))",
            )
            .await?;
        }
        txn.commit().await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Loosening the constraints back is never needed; the tightened table
        // accepts every row the loose one did.
        Ok(())
    }
}
