//! Migration to create the books table.
//!
//! Books use client-generated UUID keys and reference their author; removing an
//! author cascades to its books.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Books::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Books::AuthorId).integer().not_null())
                    .col(ColumnDef::new(Books::Title).text().not_null())
                    .col(ColumnDef::new(Books::Pages).integer().not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_books_author_id")
                            .from(Books::Table, Books::AuthorId)
                            .to(Authors::Table, Authors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_books_author_id")
                    .table(Books::Table)
                    .col(Books::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Books {
    Table,
    Id,
    AuthorId,
    Title,
    Pages,
}

#[derive(DeriveIden)]
enum Authors {
    Table,
    Id,
}
