//! Tenant management and the encrypted settings boundary
//!
//! Provider settings are sealed with the vault on every write and only
//! decrypted on read, so plaintext credentials never touch the database.

use std::sync::Arc;

use mailroom_core::SecretsVault;
use mailroom_entities::{prelude::*, tenants};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::DispatchError;
use crate::providers::registry;

pub struct CreateTenant {
    pub name: String,
    pub provider: String,
    pub settings: Option<Value>,
}

/// Partial update; `None` fields are left unchanged. An explicit JSON null
/// (or an empty object) for `settings` clears the stored settings.
#[derive(Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub settings: Option<Value>,
}

pub struct ListTenantsOptions {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

pub struct TenantService {
    db: Arc<DatabaseConnection>,
    vault: SecretsVault,
}

impl TenantService {
    pub fn new(db: Arc<DatabaseConnection>, vault: SecretsVault) -> Self {
        Self { db, vault }
    }

    pub async fn create(&self, input: CreateTenant) -> Result<tenants::Model, DispatchError> {
        if registry::metadata(&input.provider).is_none() {
            return Err(DispatchError::UnsupportedProvider(input.provider));
        }

        let existing = Tenants::find()
            .filter(tenants::Column::Name.eq(&input.name))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(DispatchError::DuplicateTenantName(input.name));
        }

        let now = chrono::Utc::now();
        let tenant = tenants::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            provider: Set(input.provider),
            settings: Set(self.seal_settings(input.settings.as_ref())?),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = tenant.insert(self.db.as_ref()).await?;
        info!("Created tenant {} ({})", model.name, model.id);
        Ok(model)
    }

    pub async fn get(&self, id: Uuid) -> Result<tenants::Model, DispatchError> {
        Tenants::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(DispatchError::TenantNotFound(id))
    }

    pub async fn list(
        &self,
        opts: ListTenantsOptions,
    ) -> Result<(Vec<tenants::Model>, u64), DispatchError> {
        let page = opts.page.unwrap_or(1).max(1);
        let page_size = std::cmp::min(opts.page_size.unwrap_or(20), 100);

        let paginator = Tenants::find()
            .order_by_desc(tenants::Column::CreatedAt)
            .paginate(self.db.as_ref(), page_size);

        let total = paginator.num_items().await?;
        let tenants = paginator.fetch_page(page - 1).await?;
        Ok((tenants, total))
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> Result<tenants::Model, DispatchError> {
        let tenant = self.get(id).await?;

        if let Some(provider) = &input.provider {
            if registry::metadata(provider).is_none() {
                return Err(DispatchError::UnsupportedProvider(provider.clone()));
            }
        }

        if let Some(name) = &input.name {
            let taken = Tenants::find()
                .filter(tenants::Column::Name.eq(name))
                .filter(tenants::Column::Id.ne(id))
                .one(self.db.as_ref())
                .await?;
            if taken.is_some() {
                return Err(DispatchError::DuplicateTenantName(name.clone()));
            }
        }

        let mut active: tenants::ActiveModel = tenant.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(provider) = input.provider {
            active.provider = Set(provider);
        }
        if let Some(settings) = input.settings.as_ref() {
            active.settings = Set(self.seal_settings(Some(settings))?);
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.db.as_ref()).await?;
        debug!("Updated tenant {}", model.id);
        Ok(model)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DispatchError> {
        let result = Tenants::delete_by_id(id).exec(self.db.as_ref()).await?;
        if result.rows_affected == 0 {
            return Err(DispatchError::TenantNotFound(id));
        }
        info!("Deleted tenant {}", id);
        Ok(())
    }

    /// Decrypt a tenant's provider settings into a JSON bag.
    ///
    /// Tenants without stored settings get an empty object so adapter
    /// construction never has to special-case them.
    pub fn settings(&self, tenant: &tenants::Model) -> Result<Value, DispatchError> {
        let Some(stored) = tenant.settings.as_deref() else {
            return Ok(Value::Object(Default::default()));
        };

        let plaintext = self.vault.decrypt(stored)?;
        if plaintext.is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        Ok(serde_json::from_str(&plaintext)?)
    }

    /// Seal a settings bag into its stored column form.
    ///
    /// Null and empty bags collapse to no stored settings at all.
    fn seal_settings(&self, settings: Option<&Value>) -> Result<Option<String>, DispatchError> {
        let settings = match settings {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };
        if settings.as_object().is_some_and(|map| map.is_empty()) {
            return Ok(None);
        }

        let plaintext = serde_json::to_string(settings)?;
        Ok(Some(self.vault.encrypt(&plaintext)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailroom_core::CIPHERTEXT_MARKER;
    use mailroom_database::test_utils::TestDatabase;
    use serde_json::json;

    const TEST_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    async fn setup() -> anyhow::Result<(TestDatabase, TenantService)> {
        let test_db = TestDatabase::with_migrations().await?;
        let vault = SecretsVault::new(TEST_KEY)?;
        let service = TenantService::new(test_db.connection_arc(), vault);
        Ok((test_db, service))
    }

    fn create_input(name: &str) -> CreateTenant {
        CreateTenant {
            name: name.to_string(),
            provider: "mock".to_string(),
            settings: Some(json!({ "server_token": "tok-123" })),
        }
    }

    #[tokio::test]
    async fn test_create_stores_settings_encrypted() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;

        let tenant = service.create(create_input("acme")).await?;
        assert_eq!(tenant.name, "acme");
        assert_eq!(tenant.provider, "mock");

        let stored = tenant.settings.as_deref().unwrap();
        assert!(stored.starts_with(CIPHERTEXT_MARKER));
        assert!(!stored.contains("tok-123"));

        let settings = service.settings(&tenant)?;
        assert_eq!(settings, json!({ "server_token": "tok-123" }));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;

        service.create(create_input("acme")).await?;
        let result = service.create(create_input("acme")).await;
        assert!(matches!(
            result,
            Err(DispatchError::DuplicateTenantName(name)) if name == "acme"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_provider() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;

        let result = service
            .create(CreateTenant {
                name: "acme".to_string(),
                provider: "sendwave".to_string(),
                settings: None,
            })
            .await;
        assert!(matches!(result, Err(DispatchError::UnsupportedProvider(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_settings_collapse_to_none() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;

        let tenant = service
            .create(CreateTenant {
                name: "bare".to_string(),
                provider: "mock".to_string(),
                settings: Some(json!({})),
            })
            .await?;

        assert!(tenant.settings.is_none());
        assert_eq!(service.settings(&tenant)?, json!({}));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_tenant() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;

        let result = service.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(DispatchError::TenantNotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_and_clears_settings() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;
        let tenant = service.create(create_input("acme")).await?;

        let updated = service
            .update(
                tenant.id,
                UpdateTenant {
                    settings: Some(json!({ "server_token": "tok-456" })),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(
            service.settings(&updated)?,
            json!({ "server_token": "tok-456" })
        );

        let cleared = service
            .update(
                tenant.id,
                UpdateTenant {
                    settings: Some(Value::Null),
                    ..Default::default()
                },
            )
            .await?;
        assert!(cleared.settings.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_taken_name() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;
        service.create(create_input("acme")).await?;
        let other = service.create(create_input("globex")).await?;

        let result = service
            .update(
                other.id,
                UpdateTenant {
                    name: Some("acme".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DispatchError::DuplicateTenantName(_))));

        // Keeping your own name is not a conflict
        let kept = service
            .update(
                other.id,
                UpdateTenant {
                    name: Some("globex".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        assert_eq!(kept.name, "globex");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_removes_tenant() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;
        let tenant = service.create(create_input("acme")).await?;

        service.delete(tenant.id).await?;
        assert!(matches!(
            service.get(tenant.id).await,
            Err(DispatchError::TenantNotFound(_))
        ));

        let result = service.delete(tenant.id).await;
        assert!(matches!(result, Err(DispatchError::TenantNotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_pagination() -> anyhow::Result<()> {
        let (_test_db, service) = setup().await?;
        for i in 0..5 {
            service
                .create(CreateTenant {
                    name: format!("tenant-{i}"),
                    provider: "mock".to_string(),
                    settings: None,
                })
                .await?;
        }

        let (page, total) = service
            .list(ListTenantsOptions {
                page: Some(1),
                page_size: Some(2),
            })
            .await?;
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);

        let (rest, _) = service
            .list(ListTenantsOptions {
                page: Some(3),
                page_size: Some(2),
            })
            .await?;
        assert_eq!(rest.len(), 1);
        Ok(())
    }
}
