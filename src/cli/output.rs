//! Output formatting for `collect` and `services`
//!
//! JSON output is meant for scripts: `collect` prints the manifest together with
//! the collection directory, `services` prints the list of service names.

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

use crate::collector::Collection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a written collection
    pub fn format_collection(&self, collection: &Collection) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "collection": collection.dir,
                    "collectedAt": collection.collected_at.to_rfc3339(),
                    "manifest": collection.manifest,
                });
                serde_json::to_string_pretty(&output).context("Failed to serialize collection to JSON")
            }
            OutputFormat::Human => Ok(self.format_collection_human(collection)),
        }
    }

    /// Formats the outcome of a scan that found nothing
    pub fn format_empty(&self, root: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "collection": null,
                    "manifest": null,
                });
                serde_json::to_string_pretty(&output).context("Failed to serialize result to JSON")
            }
            OutputFormat::Human => Ok(format!(
                "No service configuration found under {}",
                root.display()
            )),
        }
    }

    pub fn format_services(&self, services: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(services).context("Failed to serialize services to JSON")
            }
            OutputFormat::Human => {
                let mut out = format!("Supported services ({}):\n", services.len());
                for service in services {
                    let _ = writeln!(out, "  {}", service);
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    fn format_collection_human(&self, collection: &Collection) -> String {
        let manifest = &collection.manifest;
        let mut out = String::new();

        let _ = writeln!(out, "Collection: {}", collection.dir.display());
        let _ = writeln!(out, "Name:       {}", manifest.name);
        let _ = writeln!(
            out,
            "Collected:  {}",
            collection.collected_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if !manifest.customer_id.is_empty() {
            let _ = writeln!(out, "Customer:   {}", manifest.customer_id);
        }

        for (id, machine) in &manifest.machines {
            let _ = writeln!(out, "\nMachine {} ({} services)", id, machine.services.len());
            for (key, entry) in &machine.services {
                let version = if entry.version.is_empty() {
                    String::new()
                } else {
                    format!(" {}", entry.version)
                };
                let _ = writeln!(
                    out,
                    "  {}{}: {} config, {} complimentary",
                    key,
                    version,
                    entry.config_file_list.len(),
                    entry.complimentary_file_list.len()
                );
                for descriptor in entry.descriptors() {
                    let _ = writeln!(out, "    {}", descriptor.staged_path().display());
                }
            }
        }

        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{
        CollectionManifest, ConfigFileType, FileDescriptor, Machine, ManifestEntry,
    };
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn sample_collection() -> Collection {
        let mut entry = ManifestEntry::new("nginx", "");
        entry.config_file_list.push(FileDescriptor::new(
            "nginx.conf",
            "nginx.conf",
            "etc/nginx",
            ConfigFileType::Nginx,
        ));
        entry.complimentary_file_list.push(
            FileDescriptor::new("site.conf", "site.conf", ".", ConfigFileType::Nginx)
                .with_alias("sites-enabled/site.conf"),
        );

        let mut machine = Machine::new("web-01");
        machine.services.insert("nginx_0".to_string(), entry);
        let mut manifest = CollectionManifest::new("scan", "acme");
        manifest.machines.insert("web-01".to_string(), machine);

        Collection {
            dir: PathBuf::from("/tmp/confscout-collection-1"),
            manifest,
            collected_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_human_collection_summary() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_collection(&sample_collection()).unwrap();

        assert!(output.contains("Collection: /tmp/confscout-collection-1"));
        assert!(output.contains("Customer:   acme"));
        assert!(output.contains("Collected:  2024-05-01 12:30:00 UTC"));
        assert!(output.contains("Machine web-01 (1 services)"));
        assert!(output.contains("nginx_0: 1 config, 1 complimentary"));
        assert!(output.contains("etc/nginx/nginx.conf"));
    }

    #[test]
    fn test_json_collection_contains_manifest() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_collection(&sample_collection()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["collection"], "/tmp/confscout-collection-1");
        assert_eq!(value["collectedAt"], "2024-05-01T12:30:00+00:00");
        assert_eq!(value["manifest"]["customerId"], "acme");
        assert_eq!(
            value["manifest"]["machines"]["web-01"]["services"]["nginx_0"]["serviceName"],
            "nginx"
        );
    }

    #[test]
    fn test_empty_result() {
        let human = OutputFormatter::new(OutputFormat::Human)
            .format_empty(Path::new("/mnt/image"))
            .unwrap();
        assert_eq!(human, "No service configuration found under /mnt/image");

        let json = OutputFormatter::new(OutputFormat::Json)
            .format_empty(Path::new("/mnt/image"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["collection"].is_null());
    }

    #[test]
    fn test_services_listing() {
        let services = vec!["nginx".to_string(), "redis".to_string()];

        let human = OutputFormatter::new(OutputFormat::Human)
            .format_services(&services)
            .unwrap();
        assert_eq!(human, "Supported services (2):\n  nginx\n  redis");

        let json = OutputFormatter::new(OutputFormat::Json)
            .format_services(&services)
            .unwrap();
        let parsed: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, services);
    }
}
