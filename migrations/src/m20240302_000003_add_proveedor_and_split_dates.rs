use sea_orm_migration::prelude::*;

/// Placeholder written into `proveedor` for rows that predate the column.
pub const PROVEEDOR_PLACEHOLDER: &str = "Sin especificar";

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240302_000003_add_proveedor_and_split_dates"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The single `fecha` column split into payment and service dates.
        // Each add is guarded so re-running against an already-migrated store
        // is a no-op; the backfills never overwrite a non-null value.
        if !manager
            .has_column("pagos", Pagos::Proveedor.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::Proveedor);
            col.text().default(PROVEEDOR_PLACEHOLDER);
            manager
                .alter_table(
                    Table::alter()
                        .table(Pagos::Table)
                        .add_column(col)
                        .to_owned(),
                )
                .await?;
        }

        if !manager
            .has_column("pagos", Pagos::FechaPago.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::FechaPago);
            col.date().null();
            manager
                .alter_table(
                    Table::alter()
                        .table(Pagos::Table)
                        .add_column(col)
                        .to_owned(),
                )
                .await?;
        }

        if !manager
            .has_column("pagos", Pagos::FechaServicio.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::FechaServicio);
            col.date().null();
            manager
                .alter_table(
                    Table::alter()
                        .table(Pagos::Table)
                        .add_column(col)
                        .to_owned(),
                )
                .await?;
        }

        let conn = manager.get_connection();
        conn.execute_unprepared(
            "UPDATE pagos SET fecha_pago = fecha WHERE fecha_pago IS NULL AND fecha IS NOT NULL",
        )
        .await?;
        conn.execute_unprepared(
            "UPDATE pagos SET fecha_servicio = fecha WHERE fecha_servicio IS NULL AND fecha IS NOT NULL",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for col in [Pagos::Proveedor, Pagos::FechaPago, Pagos::FechaServicio] {
            if manager
                .has_column("pagos", col.to_string().as_str())
                .await?
            {
                manager
                    .alter_table(
                        Table::alter().table(Pagos::Table).drop_column(col).to_owned(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Pagos {
    Table,
    Proveedor,
    FechaPago,
    FechaServicio,
}
