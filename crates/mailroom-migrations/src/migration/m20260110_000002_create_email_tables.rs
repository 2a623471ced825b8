use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========================================
        // EMAILS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(Emails::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Emails::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Emails::FromEmail)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Emails::ToEmail).string_len(255).not_null())
                    .col(ColumnDef::new(Emails::Subject).text().not_null())
                    .col(ColumnDef::new(Emails::Body).text().not_null())
                    .col(
                        ColumnDef::new(Emails::Status)
                            .string_len(50)
                            .not_null()
                            .default("queued"),
                    )
                    .col(
                        ColumnDef::new(Emails::SentAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Emails::Provider).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Emails::ProviderMessageId)
                            .string_len(255)
                            .null(),
                    )
                    // No foreign key here: tenants may be deleted while
                    // their email history is retained.
                    .col(ColumnDef::new(Emails::ProjectId).uuid().null())
                    .col(ColumnDef::new(Emails::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(Emails::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Emails::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_emails_project_id")
                    .table(Emails::Table)
                    .col(Emails::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_emails_status")
                    .table(Emails::Table)
                    .col(Emails::Status)
                    .to_owned(),
            )
            .await?;

        // Webhook correlation looks up emails by provider + message id
        manager
            .create_index(
                Index::create()
                    .name("idx_emails_provider_message_id")
                    .table(Emails::Table)
                    .col(Emails::Provider)
                    .col(Emails::ProviderMessageId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_emails_created_at")
                    .table(Emails::Table)
                    .col(Emails::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ========================================
        // EMAIL_EVENTS TABLE
        // ========================================
        manager
            .create_table(
                Table::create()
                    .table(EmailEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailEvents::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailEvents::EmailId).uuid().not_null())
                    .col(
                        ColumnDef::new(EmailEvents::EventType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailEvents::EventTimestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailEvents::Details)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_events_email")
                            .from(EmailEvents::Table, EmailEvents::EmailId)
                            .to(Emails::Table, Emails::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_email_events_email_id")
                    .table(EmailEvents::Table)
                    .col(EmailEvents::EmailId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_email_events_event_type")
                    .table(EmailEvents::Table)
                    .col(EmailEvents::EventType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop indexes for email_events
        manager
            .drop_index(
                Index::drop()
                    .name("idx_email_events_event_type")
                    .table(EmailEvents::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_email_events_email_id")
                    .table(EmailEvents::Table)
                    .to_owned(),
            )
            .await?;

        // Drop email_events table
        manager
            .drop_table(Table::drop().table(EmailEvents::Table).to_owned())
            .await?;

        // Drop indexes for emails
        manager
            .drop_index(
                Index::drop()
                    .name("idx_emails_created_at")
                    .table(Emails::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_emails_provider_message_id")
                    .table(Emails::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_emails_status")
                    .table(Emails::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_emails_project_id")
                    .table(Emails::Table)
                    .to_owned(),
            )
            .await?;

        // Drop emails table
        manager
            .drop_table(Table::drop().table(Emails::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Emails {
    Table,
    Id,
    FromEmail,
    ToEmail,
    Subject,
    Body,
    Status,
    SentAt,
    Provider,
    ProviderMessageId,
    ProjectId,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EmailEvents {
    Table,
    Id,
    EmailId,
    EventType,
    EventTimestamp,
    Details,
    CreatedAt,
}
