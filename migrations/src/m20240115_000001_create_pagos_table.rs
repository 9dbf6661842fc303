use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // First generation of the payments table: a single date column and no
        // provider, amounts lived in the pago_items child table.
        manager
            .create_table(
                Table::create()
                    .table(Pagos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pagos::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Pagos::Local).text().not_null())
                    .col(ColumnDef::new(Pagos::Fecha).date().null())
                    .col(ColumnDef::new(Pagos::UsuarioRegistro).text().not_null())
                    .col(
                        ColumnDef::new(Pagos::FechaRegistro)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pagos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Pagos {
    Table,
    Id,
    Local,
    Fecha,
    UsuarioRegistro,
    FechaRegistro,
}
