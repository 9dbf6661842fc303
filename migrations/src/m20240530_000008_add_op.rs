use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240530_000008_add_op"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // External purchase-order number, digits only, set after the fact by
        // the one principal allowed to annotate records.
        if !manager
            .has_column("pagos", Pagos::Op.to_string().as_str())
            .await?
        {
            let mut col = ColumnDef::new(Pagos::Op);
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
        if manager
            .has_column("pagos", Pagos::Op.to_string().as_str())
            .await?
        {
            manager
                .alter_table(
                    Table::alter()
                        .table(Pagos::Table)
                        .drop_column(Pagos::Op)
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
    Op,
}
