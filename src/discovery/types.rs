use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

crate::define_tag_enum! {
    /// Format tag the downstream analyzer uses to pick a parser
    ConfigFileType {
        Nginx => "nginx",
        Apache => "apache",
        Yaml => "yaml",
        Json => "json",
        Xml => "xml",
        Properties => "properties",
        Ini => "ini",
        Krb => "krb",
        Hcl2 => "hcl2",
        Dockerfile => "dockerfile",
        Systemd => "systemd",
        Sshd => "sshd",
        Sudoers => "sudoers",
        Redis => "redis",
        Haproxy => "haproxy",
        Postgresql => "postgresql",
        PgHba => "pg_hba",
        Helm => "helm",
        Groovy => "groovy",
        Conf => "conf",
    }
}

/// One staged file inside a manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub file_name: String,
    pub default_file_name: String,
    pub sub_path: String,
    pub config_file_type: ConfigFileType,
    /// Include-directive paths that led to this file, used for de-duplication
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias_list: Vec<String>,
}

impl FileDescriptor {
    pub fn new(
        file_name: impl Into<String>,
        default_file_name: impl Into<String>,
        sub_path: impl Into<String>,
        config_file_type: ConfigFileType,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            default_file_name: default_file_name.into(),
            sub_path: sub_path.into(),
            config_file_type,
            alias_list: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias_list.push(alias.into());
        self
    }

    /// Location of the staged copy relative to the staging root
    pub fn staged_path(&self) -> PathBuf {
        if self.sub_path == "." || self.sub_path.is_empty() {
            PathBuf::from(&self.file_name)
        } else {
            Path::new(&self.sub_path).join(&self.file_name)
        }
    }
}

/// Normalized description of one discovered service instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub version: String,
    pub service_name: String,
    pub config_file_list: Vec<FileDescriptor>,
    pub complimentary_file_list: Vec<FileDescriptor>,
}

impl ManifestEntry {
    pub fn new(service_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            service_name: service_name.into(),
            config_file_list: Vec::new(),
            complimentary_file_list: Vec::new(),
        }
    }

    /// True if any staged file was already pulled in under `alias`
    pub fn has_alias(&self, alias: &str) -> bool {
        self.descriptors()
            .any(|d| d.alias_list.iter().any(|a| a == alias))
    }

    /// Config files followed by complimentary files
    pub fn descriptors(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.config_file_list
            .iter()
            .chain(self.complimentary_file_list.iter())
    }

    pub fn file_count(&self) -> usize {
        self.config_file_list.len() + self.complimentary_file_list.len()
    }
}

/// A manifest entry together with the staging directory holding its files.
///
/// The staging directory is deleted when the finding is dropped or closed.
#[derive(Debug)]
pub struct StagedFinding {
    pub entry: ManifestEntry,
    pub staging: TempDir,
    /// Original on-disk locations of the primary config files, in staging order
    pub sources: Vec<PathBuf>,
}

impl StagedFinding {
    pub fn new(entry: ManifestEntry, staging: TempDir) -> Self {
        Self {
            entry,
            staging,
            sources: Vec::new(),
        }
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    pub fn service_name(&self) -> &str {
        &self.entry.service_name
    }

    /// Deletes the staging directory, reporting failures instead of ignoring them
    pub fn close(self) -> io::Result<ManifestEntry> {
        let Self { entry, staging, .. } = self;
        staging.close()?;
        Ok(entry)
    }
}

/// Services discovered on one machine, keyed by `{serviceName}_{index}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub services: BTreeMap<String, ManifestEntry>,
}

impl Machine {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            services: BTreeMap::new(),
        }
    }
}

/// Top-level manifest written as `manifest.json` at the collection root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionManifest {
    pub name: String,
    pub customer_id: String,
    pub machines: BTreeMap<String, Machine>,
}

impl CollectionManifest {
    pub fn new(name: impl Into<String>, customer_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            customer_id: customer_id.into(),
            machines: BTreeMap::new(),
        }
    }

    pub fn service_count(&self) -> usize {
        self.machines.values().map(|m| m.services.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_type_tags() {
        assert_eq!(ConfigFileType::PgHba.as_str(), "pg_hba");
        assert_eq!(ConfigFileType::from_tag("hcl2"), ConfigFileType::Hcl2);
        assert_eq!(
            ConfigFileType::from_tag("toml"),
            ConfigFileType::Custom("toml".to_string())
        );
        assert_eq!(ConfigFileType::Custom("toml".to_string()).to_string(), "toml");
    }

    #[test]
    fn test_file_descriptor_serialization() {
        let plain = FileDescriptor::new("nginx.conf", "nginx.conf", "etc/nginx", ConfigFileType::Nginx);
        let json = serde_json::to_value(&plain).unwrap();
        assert_eq!(json["fileName"], "nginx.conf");
        assert_eq!(json["defaultFileName"], "nginx.conf");
        assert_eq!(json["subPath"], "etc/nginx");
        assert_eq!(json["configFileType"], "nginx");
        assert!(json.get("aliasList").is_none());

        let included = plain.with_alias("conf.d/*.conf");
        let json = serde_json::to_value(&included).unwrap();
        assert_eq!(json["aliasList"][0], "conf.d/*.conf");
    }

    #[test]
    fn test_staged_path() {
        let root = FileDescriptor::new("a.conf", "a.conf", ".", ConfigFileType::Conf);
        assert_eq!(root.staged_path(), PathBuf::from("a.conf"));

        let nested = FileDescriptor::new("a.conf", "a.conf", "etc/app", ConfigFileType::Conf);
        assert_eq!(nested.staged_path(), PathBuf::from("etc/app/a.conf"));
    }

    #[test]
    fn test_manifest_entry_alias_lookup() {
        let mut entry = ManifestEntry::new("nginx", "");
        entry.complimentary_file_list.push(
            FileDescriptor::new("mime.types", "mime.types", ".", ConfigFileType::Nginx)
                .with_alias("/etc/nginx/mime.types"),
        );

        assert!(entry.has_alias("/etc/nginx/mime.types"));
        assert!(!entry.has_alias("mime.types"));
        assert_eq!(entry.file_count(), 1);
    }

    #[test]
    fn test_collection_manifest_shape() {
        let mut manifest = CollectionManifest::new("scan", "customer-1");
        let mut machine = Machine::new("host-a");
        machine
            .services
            .insert("nginx_0".to_string(), ManifestEntry::new("nginx", "1.0"));
        manifest.machines.insert("host-a".to_string(), machine);

        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json["customerId"], "customer-1");
        assert_eq!(json["machines"]["host-a"]["id"], "host-a");
        assert_eq!(
            json["machines"]["host-a"]["services"]["nginx_0"]["serviceName"],
            "nginx"
        );
        assert_eq!(manifest.service_count(), 1);

        let back: CollectionManifest = serde_json::from_value(json).unwrap();
        assert_eq!(back, manifest);
    }
}
