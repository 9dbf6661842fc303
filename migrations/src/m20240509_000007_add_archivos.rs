use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240509_000007_add_archivos"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Serialized attachment list ({url, fileName, mimeType, size}), empty
        // array for every row that predates uploads.
        if !manager
            .has_column("pagos", Pagos::Archivos.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::Archivos);
            col.text().not_null().default("[]");
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
            .has_column("pagos", Pagos::Archivos.to_string().as_str())
            .await?
        {
            manager
                .alter_table(
                    Table::alter()
                        .table(Pagos::Table)
                        .drop_column(Pagos::Archivos)
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
    Archivos,
}
