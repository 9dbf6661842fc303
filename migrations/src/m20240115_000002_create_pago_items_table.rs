use sea_orm_migration::prelude::*;

use super::m20240115_000001_create_pagos_table::Pagos;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Deprecated second-generation child table: one row per expense line.
        // The current write path never inserts here, but historical rows must
        // keep loading, so the table (and its FK) stays.
        manager
            .create_table(
                Table::create()
                    .table(PagoItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PagoItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PagoItems::PagoId).integer().not_null())
                    .col(ColumnDef::new(PagoItems::Concepto).text().not_null())
                    .col(ColumnDef::new(PagoItems::Importe).double().not_null())
                    .col(ColumnDef::new(PagoItems::Observacion).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pago_items_pago_id")
                            .from(PagoItems::Table, PagoItems::PagoId)
                            .to(Pagos::Table, Pagos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PagoItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PagoItems {
    Table,
    Id,
    PagoId,
    Concepto,
    Importe,
    Observacion,
}
