//! Tenants entity
//!
//! A tenant owns a provider choice and the encrypted settings bag for it.
//! `settings` holds vault ciphertext (or legacy plaintext); it is decrypted
//! only in process, through the tenant service accessors.

use sea_orm::entity::prelude::*;
use mailroom_core::DBDateTime;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    /// Registry slug of the provider this tenant sends through
    pub provider: String,
    pub settings: Option<String>,
    pub created_at: DBDateTime,
    pub updated_at: DBDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::emails::Entity")]
    Emails,
}

impl Related<super::emails::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Emails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
