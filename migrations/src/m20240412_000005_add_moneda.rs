use sea_orm_migration::prelude::*;

/// Currency written into rows created before the column existed.
pub const MONEDA_DEFAULT: &str = "Peso";

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240412_000005_add_moneda"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager
            .has_column("pagos", Pagos::Moneda.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::Moneda);
            col.text().not_null().default(MONEDA_DEFAULT);
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
        if manager
            .has_column("pagos", Pagos::Moneda.to_string().as_str())
            .await?
        {
            manager
                .alter_table(
                    Table::alter()
                        .table(Pagos::Table)
                        .drop_column(Pagos::Moneda)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Pagos {
    Table,
    Moneda,
}
