//! Emails entity
//!
//! One row per send attempt. Status walks queued -> sent | failed and never
//! backwards; webhook ingestion only ever appends `email_events` rows.

use sea_orm::entity::prelude::*;
use mailroom_core::DBDateTime;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "emails")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub sent_at: Option<DBDateTime>,
    /// Registry slug of the provider the send went through
    pub provider: String,
    /// Provider-assigned id, set only on successful send; correlation key
    /// for inbound delivery events
    pub provider_message_id: Option<String>,
    pub project_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub created_at: DBDateTime,
    pub updated_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::email_events::Entity")]
    EmailEvents,
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::ProjectId",
        to = "super::tenants::Column::Id"
    )]
    Tenant,
}

impl Related<super::email_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailEvents.def()
    }
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
