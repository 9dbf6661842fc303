use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240425_000006_flatten_pago_items"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The per-line-item child table turned out to be overkill: every
        // submission carried exactly one line. concepto/importe/observacion
        // move onto the parent row; pago_items stays behind, read-only, for
        // rows written before this point.
        if !manager
            .has_column("pagos", Pagos::Concepto.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::Concepto);
            col.text().null();
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
            .has_column("pagos", Pagos::Importe.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::Importe);
            col.double().null();
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
            .has_column("pagos", Pagos::Observacion.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::Observacion);
            col.text().null();
            manager
                .alter_table(
                    Table::alter()
                        .table(Pagos::Table)
                        .add_column(col)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for col in [Pagos::Concepto, Pagos::Importe, Pagos::Observacion] {
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
    Concepto,
    Importe,
    Observacion,
}
