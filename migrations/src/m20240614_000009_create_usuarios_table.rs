use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sea_orm_migration::prelude::*;

/// The retired hardcoded credential map. Seeded here with hashed passwords;
/// nothing else in the codebase reads plaintext passwords anymore.
const USUARIOS_INICIALES: &[(&str, &str, &str, &str)] = &[
    ("Lucas Ortiz", "7894", "lucas@example.com", "usuario"),
    ("Julian Salvatierra", "4226", "julian@example.com", "admin"),
    ("Matias Huss", "1994", "matias@example.com", "usuario"),
    ("Lucia Molina", "6462", "lucia@example.com", "usuario"),
];

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240614_000009_create_usuarios_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Usuarios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Usuarios::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Usuarios::Username)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Usuarios::PasswordHash).text().not_null())
                    .col(ColumnDef::new(Usuarios::Email).text().null())
                    .col(
                        ColumnDef::new(Usuarios::Rol)
                            .text()
                            .not_null()
                            .default("usuario"),
                    )
                    .col(
                        ColumnDef::new(Usuarios::Activo)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Usuarios::FechaCreacion)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Usuarios::UltimoAcceso).timestamp().null())
                    .to_owned(),
            )
            .await?;

        let argon2 = Argon2::default();
        for (username, password, email, rol) in USUARIOS_INICIALES {
            let salt = SaltString::generate(&mut OsRng);
            let hash = argon2
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| DbErr::Migration(format!("password hashing failed: {e}")))?
                .to_string();

            let insert = Query::insert()
                .into_table(Usuarios::Table)
                .columns([
                    Usuarios::Username,
                    Usuarios::PasswordHash,
                    Usuarios::Email,
                    Usuarios::Rol,
                ])
                .values_panic([
                    (*username).into(),
                    hash.into(),
                    (*email).into(),
                    (*rol).into(),
                ])
                .on_conflict(
                    OnConflict::column(Usuarios::Username)
                        .do_nothing()
                        .to_owned(),
                )
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Usuarios::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Usuarios {
    Table,
    Id,
    Username,
    PasswordHash,
    Email,
    Rol,
    Activo,
    FechaCreacion,
    UltimoAcceso,
}
