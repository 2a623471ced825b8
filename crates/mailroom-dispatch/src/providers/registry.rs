//! Static provider registry
//!
//! Adapters are registered at compile time. Resolution hands each adapter the
//! settings bag it should operate with, so the same slug can serve different
//! tenants with different credentials.

use serde_json::Value;
use tracing::debug;

use super::mock::MockProvider;
use super::postmark::PostmarkProvider;
use super::traits::{EmailProvider, ProviderMetadata};
use crate::errors::DispatchError;

struct RegistryEntry {
    slug: &'static str,
    name: &'static str,
    enabled: bool,
    default: bool,
    site: Option<&'static str>,
    construct: fn(Value) -> Box<dyn EmailProvider>,
}

fn construct_postmark(settings: Value) -> Box<dyn EmailProvider> {
    Box::new(PostmarkProvider::new(settings))
}

fn construct_mock(settings: Value) -> Box<dyn EmailProvider> {
    Box::new(MockProvider::new(settings))
}

/// Known adapters in resolution order. At most one entry should carry the
/// default flag; if several do, the first enabled one wins.
static REGISTRY: &[RegistryEntry] = &[
    RegistryEntry {
        slug: PostmarkProvider::SLUG,
        name: "Postmark",
        enabled: true,
        default: true,
        site: Some("https://postmarkapp.com"),
        construct: construct_postmark,
    },
    RegistryEntry {
        slug: MockProvider::SLUG,
        name: "Mock",
        enabled: true,
        default: false,
        site: None,
        construct: construct_mock,
    },
];

impl RegistryEntry {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: self.slug.to_string(),
            name: self.name.to_string(),
            enabled: self.enabled,
            default: self.default,
            site: self.site.map(str::to_string),
        }
    }
}

fn find(slug: &str) -> Option<&'static RegistryEntry> {
    REGISTRY.iter().find(|entry| entry.slug == slug)
}

fn default_entry(entries: &[RegistryEntry]) -> Option<&RegistryEntry> {
    entries.iter().find(|entry| entry.enabled && entry.default)
}

/// Construct the adapter registered under `slug` with the given settings.
pub fn resolve(slug: &str, settings: Value) -> Result<Box<dyn EmailProvider>, DispatchError> {
    let entry = find(slug).ok_or_else(|| DispatchError::UnsupportedProvider(slug.to_string()))?;
    debug!("Resolved provider adapter: {}", slug);
    Ok((entry.construct)(settings))
}

/// Metadata for a single registered slug, if any.
pub fn metadata(slug: &str) -> Option<ProviderMetadata> {
    find(slug).map(RegistryEntry::metadata)
}

/// Metadata for every registered adapter, optionally restricted to enabled ones.
pub fn list(enabled_only: bool) -> Vec<ProviderMetadata> {
    REGISTRY
        .iter()
        .filter(|entry| !enabled_only || entry.enabled)
        .map(RegistryEntry::metadata)
        .collect()
}

/// Construct the default adapter together with its metadata.
pub fn default_provider(
    settings: Value,
) -> Result<(ProviderMetadata, Box<dyn EmailProvider>), DispatchError> {
    let entry = default_entry(REGISTRY).ok_or(DispatchError::NoDefaultProvider)?;
    Ok((entry.metadata(), (entry.construct)(settings)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_known_slugs() {
        assert!(resolve("postmark", json!({})).is_ok());
        assert!(resolve("mock", json!({})).is_ok());
    }

    #[test]
    fn test_resolve_unknown_slug() {
        let result = resolve("sendwave", json!({}));
        assert!(matches!(
            result,
            Err(DispatchError::UnsupportedProvider(slug)) if slug == "sendwave"
        ));
    }

    #[test]
    fn test_list_includes_metadata() {
        let all = list(false);
        assert_eq!(all.len(), 2);

        let postmark = all.iter().find(|provider| provider.id == "postmark").unwrap();
        assert_eq!(postmark.name, "Postmark");
        assert!(postmark.enabled);
        assert!(postmark.default);
        assert_eq!(postmark.site.as_deref(), Some("https://postmarkapp.com"));

        let mock = all.iter().find(|provider| provider.id == "mock").unwrap();
        assert!(!mock.default);
    }

    #[test]
    fn test_default_provider_is_postmark() {
        let (metadata, _) = default_provider(json!({})).unwrap();
        assert_eq!(metadata.id, "postmark");
    }

    #[test]
    fn test_default_entry_requires_enabled_and_default() {
        fn entry(slug: &'static str, enabled: bool, default: bool) -> RegistryEntry {
            RegistryEntry {
                slug,
                name: slug,
                enabled,
                default,
                site: None,
                construct: construct_mock,
            }
        }

        let none_default = [entry("a", true, false), entry("b", true, false)];
        assert!(default_entry(&none_default).is_none());

        let disabled_default = [entry("a", false, true), entry("b", true, false)];
        assert!(default_entry(&disabled_default).is_none());

        // Table order breaks ties between multiple candidates
        let two_defaults = [entry("a", true, true), entry("b", true, true)];
        assert_eq!(default_entry(&two_defaults).unwrap().slug, "a");
    }
}
