use super::catalog::catalog;
use super::{CatalogFinder, Finder, HelmFinder, PostgresFinder, ServiceId};
use std::sync::Arc;
use tracing::warn;

/// Ordered set of finders run by the collector
pub struct FinderRegistry {
    finders: Vec<Arc<dyn Finder>>,
}

impl FinderRegistry {
    pub fn new() -> Self {
        Self {
            finders: Vec::new(),
        }
    }

    /// Every built-in finder. Finders whose patterns fail to compile are skipped.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        for spec in catalog() {
            let id = spec.id.clone();
            match CatalogFinder::new(spec) {
                Ok(finder) => registry.register(Arc::new(finder)),
                Err(err) => warn!(service = %id, error = %err, "Skipping finder"),
            }
        }

        match PostgresFinder::new() {
            Ok(finder) => registry.register(Arc::new(finder)),
            Err(err) => warn!(service = %ServiceId::Postgresql, error = %err, "Skipping finder"),
        }
        registry.register(Arc::new(HelmFinder::new()));

        registry
    }

    /// Adds a finder; a finder for an already registered service replaces it in place
    pub fn register(&mut self, finder: Arc<dyn Finder>) {
        let service = finder.service();
        match self.finders.iter_mut().find(|f| f.service() == service) {
            Some(existing) => *existing = finder,
            None => self.finders.push(finder),
        }
    }

    pub fn finders(&self) -> &[Arc<dyn Finder>] {
        &self.finders
    }

    pub fn get(&self, service: &ServiceId) -> Option<Arc<dyn Finder>> {
        self.finders
            .iter()
            .find(|f| &f.service() == service)
            .cloned()
    }

    pub fn service_names(&self) -> Vec<String> {
        self.finders.iter().map(|f| f.service_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }
}

impl Default for FinderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{ContainerDescriptor, DiscoveryContext, StagedFinding};

    struct NullFinder(ServiceId);

    impl Finder for NullFinder {
        fn service(&self) -> ServiceId {
            self.0.clone()
        }

        fn standard_location_search(&self, _ctx: &DiscoveryContext) -> Option<StagedFinding> {
            None
        }

        fn filesystem_search(&self, _ctx: &DiscoveryContext) -> Vec<StagedFinding> {
            Vec::new()
        }

        fn call_command_search(
            &self,
            _ctx: &DiscoveryContext,
            _container: Option<&ContainerDescriptor>,
        ) -> Vec<StagedFinding> {
            Vec::new()
        }
    }

    #[test]
    fn test_defaults_cover_every_service() {
        let registry = FinderRegistry::with_defaults();
        for id in ServiceId::all_variants() {
            assert!(registry.get(id).is_some(), "missing finder for {}", id);
        }
        assert_eq!(registry.len(), ServiceId::all_variants().len());
        assert_eq!(registry.service_names()[0], "nginx");
    }

    #[test]
    fn test_register_replaces_same_service() {
        let mut registry = FinderRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(NullFinder(ServiceId::Redis)));
        registry.register(Arc::new(NullFinder(ServiceId::Custom("vault".into()))));
        registry.register(Arc::new(NullFinder(ServiceId::Redis)));

        assert_eq!(registry.service_names(), vec!["redis", "vault"]);
    }
}
