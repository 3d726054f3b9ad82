//! Read-only registry of configured social media services.
//!
//! Built once at startup from `[services.<name>]` config entries and shared
//! behind an `Arc` by every request. Lookups are case-insensitive.

use super::create_service;
use super::traits::SocialService;
use crate::config::ServiceConfig;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A resolved reference to one back end, tagged with its registered name.
#[derive(Clone)]
pub struct ServiceHandle {
    name: String,
    service: Arc<dyn SocialService>,
}

impl ServiceHandle {
    pub fn new(name: impl Into<String>, service: Arc<dyn SocialService>) -> Self {
        Self {
            name: name.into(),
            service,
        }
    }

    /// Registered (lower-case) name, e.g. `"twitter"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &dyn SocialService {
        self.service.as_ref()
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("name", &self.name)
            .field("kind", &self.service.name())
            .finish()
    }
}

/// Lookup miss. Lists every registered name so the user can correct the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownService {
    pub name: String,
    pub known: Vec<String>,
}

impl fmt::Display for UnknownService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = self
            .known
            .iter()
            .map(|name| format!("`{name}`"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "There is no social media service named `{}`. The known services are: {known}.",
            self.name
        )
    }
}

impl std::error::Error for UnknownService {}

#[derive(Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, ServiceHandle>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every configured service. Fails on the first entry that cannot be constructed.
    pub fn from_config(services: &BTreeMap<String, ServiceConfig>) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        for (name, config) in services {
            let service = create_service(name, config)
                .with_context(|| format!("Failed to set up service `{name}`"))?;
            registry.register(name, service)?;
        }
        Ok(registry)
    }

    /// Add a service under `name` (stored lower-cased). Names must be unique
    /// after lower-casing.
    pub fn register(&mut self, name: &str, service: Arc<dyn SocialService>) -> anyhow::Result<()> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            anyhow::bail!("Service name must not be empty");
        }
        if self.services.contains_key(&key) {
            anyhow::bail!("Service `{key}` is registered more than once");
        }
        tracing::debug!(service = %key, kind = service.name(), "registered service");
        self.services
            .insert(key.clone(), ServiceHandle::new(key, service));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<ServiceHandle, UnknownService> {
        self.services
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| UnknownService {
                name: name.to_string(),
                known: self.names(),
            })
    }

    /// Registered names in ascending order.
    pub fn names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceHandle> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceKind;
    use crate::testing::RecordingService;

    fn registry_with(names: &[&str]) -> ServiceRegistry {
        let mut registry = ServiceRegistry::new();
        for name in names {
            registry
                .register(name, Arc::new(RecordingService::new()))
                .unwrap();
        }
        registry
    }

    #[test]
    fn registry_default_is_empty() {
        let registry = ServiceRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = registry_with(&["twitter"]);
        let lower = registry.resolve("twitter").unwrap();
        let upper = registry.resolve("TWITTER").unwrap();
        let mixed = registry.resolve("Twitter").unwrap();
        assert_eq!(lower.name(), "twitter");
        assert_eq!(upper.name(), "twitter");
        assert_eq!(mixed.name(), "twitter");
    }

    #[test]
    fn register_lowercases_names() {
        let registry = registry_with(&["Mastodon"]);
        assert_eq!(registry.names(), vec!["mastodon"]);
        assert!(registry.resolve("mastodon").is_ok());
    }

    #[test]
    fn register_rejects_duplicates_after_lowercasing() {
        let mut registry = registry_with(&["twitter"]);
        let err = registry
            .register("Twitter", Arc::new(RecordingService::new()))
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn register_rejects_blank_name() {
        let mut registry = ServiceRegistry::new();
        assert!(registry
            .register("  ", Arc::new(RecordingService::new()))
            .is_err());
    }

    #[test]
    fn unknown_service_message_lists_single_service() {
        let registry = registry_with(&["twitter"]);
        let err = registry.resolve("unknown").unwrap_err();
        assert_eq!(
            err.to_string(),
            "There is no social media service named `unknown`. The known services are: `twitter`."
        );
    }

    #[test]
    fn unknown_service_message_lists_every_name_once_in_order() {
        let registry = registry_with(&["twitter", "bluesky", "mastodon"]);
        let message = registry.resolve("myspace").unwrap_err().to_string();
        for name in ["`bluesky`", "`mastodon`", "`twitter`"] {
            assert_eq!(message.matches(name).count(), 1, "{name} in {message}");
        }
        assert!(message.ends_with("`bluesky`, `mastodon`, `twitter`."));
    }

    #[test]
    fn from_config_builds_log_services() {
        let mut services = BTreeMap::new();
        services.insert(
            "Staging".to_string(),
            ServiceConfig {
                kind: ServiceKind::Log,
                ..ServiceConfig::default()
            },
        );
        let registry = ServiceRegistry::from_config(&services).unwrap();
        assert_eq!(registry.names(), vec!["staging"]);
        assert_eq!(registry.resolve("staging").unwrap().service().name(), "log");
    }

    #[test]
    fn from_config_reports_failing_entry() {
        let mut services = BTreeMap::new();
        services.insert(
            "twitter".to_string(),
            ServiceConfig {
                kind: ServiceKind::Twitter,
                access_token: None,
                ..ServiceConfig::default()
            },
        );
        let err = ServiceRegistry::from_config(&services)
            .err()
            .expect("missing access token must fail");
        assert!(format!("{err:#}").contains("twitter"));
    }
}
