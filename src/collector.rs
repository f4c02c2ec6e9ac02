//! Discovery orchestration
//!
//! The [`Collector`] runs every registered finder against a scan root and
//! merges their staged findings into one collection directory:
//!
//! ```text
//! <output_dir>/confscout-collection-<uuid>/
//!   manifest.json
//!   <instance_id>/
//!     nginx_0/etc/nginx/nginx.conf
//!     nginx_0/site.conf
//!     redis_0/etc/redis/redis.conf
//! ```

use crate::config::ConfscoutConfig;
use crate::discovery::{
    CollectionManifest, ContainerDescriptor, DiscoveryContext, DiscoveryError, DiscoveryOptions,
    Machine, StagedFinding,
};
use crate::finder::FinderRegistry;
use crate::fs::copy_dir_all;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const COLLECTION_PREFIX: &str = "confscout-collection-";
pub const DEFAULT_COLLECTION_NAME: &str = "confscout";

/// A written collection directory and the manifest stored in it
#[derive(Debug, Clone)]
pub struct Collection {
    pub dir: PathBuf,
    pub manifest: CollectionManifest,
    pub collected_at: DateTime<Utc>,
}

impl Collection {
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE_NAME)
    }

    /// Deletes the collection directory
    pub fn remove(self) -> io::Result<()> {
        fs::remove_dir_all(&self.dir)
    }
}

pub struct Collector {
    registry: FinderRegistry,
    options: DiscoveryOptions,
    output_dir: PathBuf,
    collection_name: String,
    customer_id: String,
}

impl Collector {
    pub fn new(registry: FinderRegistry, options: DiscoveryOptions) -> Self {
        Self {
            registry,
            options,
            output_dir: env::temp_dir(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            customer_id: String::new(),
        }
    }

    /// Collector with every built-in finder, configured from `config`
    pub fn from_config(config: &ConfscoutConfig) -> Self {
        Self::new(FinderRegistry::with_defaults(), config.discovery_options())
            .with_output_dir(config.output_dir.clone())
            .with_collection_name(config.collection_name.clone())
            .with_customer_id(config.customer_id.clone())
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn with_customer_id(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = customer_id.into();
        self
    }

    pub fn registry(&self) -> &FinderRegistry {
        &self.registry
    }

    /// Runs every finder and returns the staged findings in registry order
    pub fn discover(
        &self,
        root: &Path,
        container: Option<&ContainerDescriptor>,
    ) -> Result<Vec<StagedFinding>, DiscoveryError> {
        if !root.exists() {
            return Err(DiscoveryError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
        }

        let ctx = DiscoveryContext::new(root, self.options.clone());
        let mut findings = Vec::new();
        for finder in self.registry.finders() {
            let found = finder.find(&ctx, container);
            debug!(service = %finder.service_name(), count = found.len(), "Finder completed");
            findings.extend(found);
        }

        info!(
            root = %root.display(),
            files = ctx.files().len(),
            findings = findings.len(),
            "Discovery completed"
        );
        Ok(findings)
    }

    /// Discovers configuration under `root` and writes it as a collection.
    ///
    /// Returns `Ok(None)` when no finder found anything; no directory is created then.
    pub fn collect(
        &self,
        root: &Path,
        instance_id: &str,
        container: Option<&ContainerDescriptor>,
    ) -> Result<Option<Collection>, DiscoveryError> {
        let findings = self.discover(root, container)?;
        if findings.is_empty() {
            info!(root = %root.display(), "No configuration found");
            return Ok(None);
        }

        let dir = self
            .output_dir
            .join(format!("{}{}", COLLECTION_PREFIX, Uuid::new_v4()));
        fs::create_dir_all(&dir).map_err(|e| DiscoveryError::io(&dir, e))?;

        match self.write_collection(&dir, instance_id, findings) {
            Ok(manifest) => {
                info!(
                    collection = %dir.display(),
                    services = manifest.service_count(),
                    "Collection written"
                );
                Ok(Some(Collection {
                    dir,
                    manifest,
                    collected_at: Utc::now(),
                }))
            }
            Err(err) => {
                if let Err(cleanup) = fs::remove_dir_all(&dir) {
                    warn!(collection = %dir.display(), error = %cleanup, "Failed to remove partial collection");
                }
                Err(err)
            }
        }
    }

    fn write_collection(
        &self,
        dir: &Path,
        instance_id: &str,
        findings: Vec<StagedFinding>,
    ) -> Result<CollectionManifest, DiscoveryError> {
        let machine_dir = dir.join(sanitize_instance_id(instance_id));
        let mut machine = Machine::new(instance_id);
        let mut counters: HashMap<String, usize> = HashMap::new();

        for finding in findings {
            let service = finding.service_name().to_string();
            let index = counters.entry(service.clone()).or_insert(0);
            let key = format!("{}_{}", service, index);
            *index += 1;

            let target = machine_dir.join(&key);
            copy_dir_all(finding.staging_path(), &target)
                .map_err(|e| DiscoveryError::io(&target, e))?;

            let entry = finding.entry.clone();
            let staging = finding.staging_path().to_path_buf();
            if let Err(err) = finding.close() {
                warn!(staging = %staging.display(), error = %err, "Failed to remove staging directory");
            }
            debug!(service = %key, target = %target.display(), "Finding copied into collection");
            machine.services.insert(key, entry);
        }

        let mut manifest = CollectionManifest::new(self.collection_name.clone(), self.customer_id.clone());
        manifest.machines.insert(instance_id.to_string(), machine);

        let manifest_path = dir.join(MANIFEST_FILE_NAME);
        let json = serde_json::to_string_pretty(&manifest)?;
        fs::write(&manifest_path, json).map_err(|e| DiscoveryError::io(&manifest_path, e))?;

        Ok(manifest)
    }
}

/// Makes an instance id usable as a single directory name
pub fn sanitize_instance_id(instance_id: &str) -> String {
    let safe = instance_id.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
    match safe.trim() {
        "" | "." | ".." => "instance".to_string(),
        _ => safe,
    }
}
