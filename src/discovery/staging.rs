//! Copying discovered files into per-finding staging directories

use super::context::DiscoveryContext;
use super::types::{ConfigFileType, FileDescriptor, ManifestEntry, StagedFinding};
use crate::fs::{file_name, to_posix};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Canonical name the analyzer expects for a staged file
#[derive(Clone)]
pub enum DefaultName {
    Fixed(String),
    /// Computed from the file's own basename
    Derived(fn(&str) -> String),
}

impl DefaultName {
    pub fn fixed(name: impl Into<String>) -> Self {
        Self::Fixed(name.into())
    }

    /// Keeps the file's own basename
    pub fn basename() -> Self {
        Self::Derived(|name| name.to_string())
    }

    pub fn for_file(&self, basename: &str) -> String {
        match self {
            Self::Fixed(name) => name.clone(),
            Self::Derived(derive) => derive(basename),
        }
    }
}

impl fmt::Debug for DefaultName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(name) => f.debug_tuple("Fixed").field(name).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Service-level fields stamped onto every finding a finder builds
#[derive(Debug, Clone)]
pub struct FindingTemplate {
    pub service_name: String,
    pub version: String,
    pub default_name: DefaultName,
    pub file_type: ConfigFileType,
}

impl FindingTemplate {
    pub fn new(service_name: impl Into<String>, file_type: ConfigFileType) -> Self {
        Self {
            service_name: service_name.into(),
            version: String::new(),
            default_name: DefaultName::basename(),
            file_type,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_default_name(mut self, default_name: DefaultName) -> Self {
        self.default_name = default_name;
        self
    }

    fn new_entry(&self) -> ManifestEntry {
        ManifestEntry::new(self.service_name.clone(), self.version.clone())
    }
}

/// Stages one file as the only config file of a new finding.
///
/// Returns `None` when the source (after symlink resolution) is not a regular
/// file or cannot be copied.
pub fn build_single(
    ctx: &DiscoveryContext,
    template: &FindingTemplate,
    source: &Path,
) -> Option<StagedFinding> {
    let staging = match ctx.allocate_staging() {
        Ok(dir) => dir,
        Err(err) => {
            warn!(error = %err, "Failed to allocate staging directory");
            return None;
        }
    };

    let mut finding = StagedFinding::new(template.new_entry(), staging);
    if !stage_config_file(ctx, &mut finding, source, &template.default_name, &template.file_type) {
        return None;
    }
    debug!(
        service = %template.service_name,
        path = %source.display(),
        staging = %finding.staging_path().display(),
        "Staged configuration file"
    );
    Some(finding)
}

/// Stages every group as its own finding with one descriptor per file.
///
/// Files that fail to stage are skipped; groups with no staged file are dropped.
pub fn build_grouped(
    ctx: &DiscoveryContext,
    template: &FindingTemplate,
    groups: &BTreeMap<String, Vec<PathBuf>>,
) -> Vec<StagedFinding> {
    let mut findings = Vec::new();

    for (key, files) in groups {
        let staging = match ctx.allocate_staging() {
            Ok(dir) => dir,
            Err(err) => {
                warn!(group = %key, error = %err, "Failed to allocate staging directory");
                continue;
            }
        };
        let mut finding = StagedFinding::new(template.new_entry(), staging);

        for file in files {
            stage_config_file(ctx, &mut finding, file, &template.default_name, &template.file_type);
        }

        if finding.entry.config_file_list.is_empty() {
            warn!(service = %template.service_name, group = %key, "No file of the group could be staged");
            continue;
        }
        debug!(
            service = %template.service_name,
            group = %key,
            files = finding.entry.config_file_list.len(),
            "Staged configuration group"
        );
        findings.push(finding);
    }

    findings
}

/// Copies `source` into the finding's staging tree and appends a config file descriptor.
///
/// The copy keeps the source's root-relative directory as its sub-path. Returns
/// false (after logging) when nothing was staged.
pub fn stage_config_file(
    ctx: &DiscoveryContext,
    finding: &mut StagedFinding,
    source: &Path,
    default_name: &DefaultName,
    file_type: &ConfigFileType,
) -> bool {
    let Some(name) = file_name(source) else {
        return false;
    };
    let Some(resolved) = ctx.resolve(source) else {
        warn!(path = %source.display(), "Unresolvable symlink, skipping file");
        return false;
    };
    if !resolved.is_file() {
        warn!(
            path = %source.display(),
            target = %resolved.display(),
            "Source is not a regular file, skipping"
        );
        return false;
    }
    if finding.sources.contains(&resolved) {
        debug!(path = %resolved.display(), "File already staged for this finding");
        return false;
    }

    let sub_path = source
        .parent()
        .and_then(|dir| dir.strip_prefix(ctx.root()).ok())
        .map(to_posix)
        .unwrap_or_else(|| ".".to_string());
    let descriptor = FileDescriptor::new(
        name.clone(),
        default_name.for_file(&name),
        sub_path,
        file_type.clone(),
    );

    let target = finding.staging_path().join(descriptor.staged_path());
    if let Err(err) = copy_file(&resolved, &target) {
        warn!(
            path = %resolved.display(),
            target = %target.display(),
            error = %err,
            "Failed to stage file"
        );
        return false;
    }

    finding.entry.config_file_list.push(descriptor);
    finding.sources.push(resolved);
    true
}

pub(crate) fn copy_file(source: &Path, target: &Path) -> std::io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn template() -> FindingTemplate {
        FindingTemplate::new("redis", ConfigFileType::Redis).with_version("7")
    }

    #[test]
    fn test_build_single_copies_byte_identical() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("etc/redis")).unwrap();
        let content = b"bind 127.0.0.1\nport 6379\n\x00binary-tail";
        fs::write(root.path().join("etc/redis/redis.conf"), content).unwrap();
        let ctx = DiscoveryContext::with_defaults(root.path());

        let finding = build_single(&ctx, &template(), &root.path().join("etc/redis/redis.conf"))
            .expect("finding");

        assert_eq!(finding.entry.service_name, "redis");
        assert_eq!(finding.entry.version, "7");
        let descriptor = &finding.entry.config_file_list[0];
        assert_eq!(descriptor.file_name, "redis.conf");
        assert_eq!(descriptor.default_file_name, "redis.conf");
        assert_eq!(descriptor.sub_path, "etc/redis");
        assert_eq!(descriptor.config_file_type, ConfigFileType::Redis);

        let staged = fs::read(finding.staging_path().join(descriptor.staged_path())).unwrap();
        assert_eq!(staged, content);
    }

    #[test]
    fn test_build_single_missing_source() {
        let root = TempDir::new().unwrap();
        let ctx = DiscoveryContext::with_defaults(root.path());
        assert!(build_single(&ctx, &template(), &root.path().join("nope.conf")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_build_single_follows_link_keeping_link_location() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("opt/redis")).unwrap();
        fs::create_dir_all(root.path().join("etc")).unwrap();
        fs::write(root.path().join("opt/redis/real.conf"), "port 1").unwrap();
        std::os::unix::fs::symlink("/opt/redis/real.conf", root.path().join("etc/redis.conf"))
            .unwrap();
        let ctx = DiscoveryContext::with_defaults(root.path());

        let finding = build_single(&ctx, &template(), &root.path().join("etc/redis.conf")).unwrap();

        let descriptor = &finding.entry.config_file_list[0];
        assert_eq!(descriptor.file_name, "redis.conf");
        assert_eq!(descriptor.sub_path, "etc");
        assert_eq!(
            fs::read_to_string(finding.staging_path().join("etc/redis.conf")).unwrap(),
            "port 1"
        );
        assert_eq!(finding.sources, vec![root.path().join("opt/redis/real.conf")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_build_grouped_skips_failed_files() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("infra/net")).unwrap();
        fs::create_dir_all(root.path().join("broken")).unwrap();
        fs::write(root.path().join("infra/main.tf"), "resource {}").unwrap();
        fs::write(root.path().join("infra/net/vpc.tf"), "module {}").unwrap();
        std::os::unix::fs::symlink("/missing.tf", root.path().join("infra/dangling.tf")).unwrap();
        std::os::unix::fs::symlink("/missing.tf", root.path().join("broken/only.tf")).unwrap();
        let ctx = DiscoveryContext::with_defaults(root.path());

        let mut groups = BTreeMap::new();
        groups.insert(
            "infra".to_string(),
            vec![
                root.path().join("infra/main.tf"),
                root.path().join("infra/dangling.tf"),
                root.path().join("infra/net/vpc.tf"),
            ],
        );
        groups.insert("broken".to_string(), vec![root.path().join("broken/only.tf")]);

        let template = FindingTemplate::new("terraform", ConfigFileType::Hcl2);
        let findings = build_grouped(&ctx, &template, &groups);

        assert_eq!(findings.len(), 1);
        let names: Vec<_> = findings[0]
            .entry
            .config_file_list
            .iter()
            .map(|d| d.staged_path())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("infra/main.tf"), PathBuf::from("infra/net/vpc.tf")]
        );
        for descriptor in &findings[0].entry.config_file_list {
            assert!(findings[0].staging_path().join(descriptor.staged_path()).is_file());
        }
    }

    #[test]
    fn test_derived_default_name() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("web.service"), "[Unit]").unwrap();
        let ctx = DiscoveryContext::with_defaults(root.path());

        let template = FindingTemplate::new("systemd", ConfigFileType::Systemd)
            .with_default_name(DefaultName::Derived(|name| format!("unit-{}", name)));
        let finding = build_single(&ctx, &template, &root.path().join("web.service")).unwrap();

        let descriptor = &finding.entry.config_file_list[0];
        assert_eq!(descriptor.default_file_name, "unit-web.service");
        assert_eq!(descriptor.sub_path, ".");
        assert_eq!(DefaultName::fixed("x.conf").for_file("y.conf"), "x.conf");
    }

    #[test]
    fn test_staging_removed_on_close() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("redis.conf"), "port 1").unwrap();
        let ctx = DiscoveryContext::with_defaults(root.path());

        let finding = build_single(&ctx, &template(), &root.path().join("redis.conf")).unwrap();
        let staging = finding.staging_path().to_path_buf();
        assert!(staging.is_dir());

        let entry = finding.close().unwrap();
        assert_eq!(entry.service_name, "redis");
        assert!(!staging.exists());
    }
}
