//! Recursive resolution of include directives
//!
//! Many formats pull in further files (`include conf.d/*.conf;`,
//! `!includedir /etc/mysql/conf.d/`, `Include /etc/ssh/sshd_config.d/*.conf`).
//! Every file reached that way is copied next to the primary config in the
//! finding's staging directory and tagged with the alias it was included under,
//! so repeated inclusions are staged once.

use super::context::DiscoveryContext;
use super::error::DiscoveryError;
use super::pattern::adapt;
use super::staging::copy_file;
use super::types::{ConfigFileType, FileDescriptor, ManifestEntry};
use crate::fs::glob::matching_paths;
use crate::fs::{file_name, reroot, virtual_path, walk_dir};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a file format spells its include directives
#[derive(Debug, Clone)]
pub struct IncludeRule {
    pub file_type: ConfigFileType,
    /// Group 1 captures a file pattern
    single: Regex,
    /// Group 1 captures a directory whose direct children are included
    directory: Option<Regex>,
    /// Regex fragment a directory child's name must end with
    suffix: Option<String>,
    suffix_matcher: Option<Regex>,
    /// Included files become config files with this default name instead of complimentary files
    included_default_name: Option<String>,
}

impl IncludeRule {
    pub fn new(single: &str, file_type: ConfigFileType) -> Result<Self, DiscoveryError> {
        Ok(Self {
            file_type,
            single: compile(single)?,
            directory: None,
            suffix: None,
            suffix_matcher: None,
            included_default_name: None,
        })
    }

    pub fn with_directory(mut self, pattern: &str) -> Result<Self, DiscoveryError> {
        self.directory = Some(compile(pattern)?);
        Ok(self)
    }

    pub fn with_suffix(mut self, suffix: &str) -> Result<Self, DiscoveryError> {
        self.suffix_matcher = Some(compile(&format!("{}$", suffix))?);
        self.suffix = Some(suffix.to_string());
        Ok(self)
    }

    pub fn with_included_default_name(mut self, name: impl Into<String>) -> Self {
        self.included_default_name = Some(name.into());
        self
    }

    fn accepts_child(&self, name: &str) -> bool {
        self.suffix_matcher
            .as_ref()
            .map(|re| re.is_match(name))
            .unwrap_or(true)
    }
}

fn compile(pattern: &str) -> Result<Regex, DiscoveryError> {
    Regex::new(pattern).map_err(|source| DiscoveryError::invalid_pattern(pattern, source))
}

/// Stages every file transitively included by `file_path` into `staging_dir`.
///
/// Descriptors are appended to `entry`. Each source file is scanned at most once
/// per call, so include cycles terminate. Includes already recorded under the
/// same alias are skipped, which makes repeated calls idempotent.
pub fn resolve_includes(
    ctx: &DiscoveryContext,
    file_path: &Path,
    staging_dir: &Path,
    entry: &mut ManifestEntry,
    rule: &IncludeRule,
) {
    let mut resolver = IncludeResolver {
        ctx,
        staging_dir,
        rule,
        visited: HashSet::new(),
    };
    resolver.process(file_path, entry);
}

struct IncludeResolver<'a> {
    ctx: &'a DiscoveryContext,
    staging_dir: &'a Path,
    rule: &'a IncludeRule,
    visited: HashSet<PathBuf>,
}

impl IncludeResolver<'_> {
    fn process(&mut self, file_path: &Path, entry: &mut ManifestEntry) {
        let Some(resolved) = self.ctx.resolve(file_path) else {
            warn!(path = %file_path.display(), "Unresolvable symlink, not scanning for includes");
            return;
        };
        let key = fs::canonicalize(&resolved).unwrap_or_else(|_| resolved.clone());
        if !self.visited.insert(key) {
            debug!(path = %resolved.display(), "Include cycle detected, file already scanned");
            return;
        }
        let Some(content) = self.ctx.read_candidate(&resolved) else {
            warn!(path = %resolved.display(), "Cannot read file, not scanning for includes");
            return;
        };

        let singles = collect_captures(&content, &self.rule.single);
        let directories = self
            .rule
            .directory
            .as_ref()
            .map(|re| collect_captures(&content, re))
            .unwrap_or_default();
        let base = resolved
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.ctx.root().to_path_buf());

        for pattern in &singles {
            let expected = self.expected_path(&base, pattern);
            let candidates: Vec<PathBuf> = matching_paths(&expected)
                .into_iter()
                .filter(|p| !p.is_dir() || p.is_symlink())
                .collect();
            if candidates.is_empty() {
                debug!(pattern = %pattern, expected = %expected.display(), "Include matched nothing");
            }
            for candidate in candidates {
                let alias = self.alias_for(pattern, &candidate, "");
                self.stage_included(&candidate, alias, entry);
            }
        }

        let child_suffix = format!("/[^/]*{}", self.rule.suffix.as_deref().unwrap_or(""));
        for pattern in &directories {
            let expected = self.expected_path(&base, pattern);
            for dir in matching_paths(&expected) {
                let Some(real_dir) = self.ctx.resolve(&dir) else {
                    warn!(path = %dir.display(), "Unresolvable include directory");
                    continue;
                };
                if !real_dir.is_dir() {
                    debug!(path = %real_dir.display(), "Include directory is not a directory");
                    continue;
                }
                for child in walk_dir(&real_dir, Some(1)) {
                    if child.is_dir() && !child.is_symlink() {
                        continue;
                    }
                    let accepted = file_name(&child)
                        .map(|name| self.rule.accepts_child(&name))
                        .unwrap_or(false);
                    if !accepted {
                        continue;
                    }
                    let alias =
                        self.alias_for(pattern.trim_end_matches('/'), &child, &child_suffix);
                    self.stage_included(&child, alias, entry);
                }
            }
        }
    }

    /// Absolute patterns are based at the scan root, relative ones at the including file's directory
    fn expected_path(&self, base: &Path, pattern: &str) -> PathBuf {
        let root = self.ctx.root();
        if pattern.starts_with('/') {
            reroot(root, Path::new(pattern))
        } else {
            reroot(root, &virtual_path(root, base).join(pattern))
        }
    }

    fn alias_for(&self, pattern: &str, candidate: &Path, suffix: &str) -> String {
        let concrete = candidate.to_string_lossy();
        adapt(pattern, false, &concrete, suffix).unwrap_or_else(|| {
            virtual_path(self.ctx.root(), candidate)
                .to_string_lossy()
                .into_owned()
        })
    }

    fn stage_included(&mut self, candidate: &Path, alias: String, entry: &mut ManifestEntry) {
        if entry.has_alias(&alias) {
            debug!(alias = %alias, "Include already staged");
            return;
        }
        let Some(resolved) = self.ctx.resolve(candidate) else {
            warn!(path = %candidate.display(), "Unresolvable symlink in include, skipping");
            return;
        };
        if !resolved.is_file() {
            warn!(
                path = %candidate.display(),
                target = %resolved.display(),
                "Included file does not exist, skipping"
            );
            return;
        }
        let Some(basename) = file_name(candidate) else {
            return;
        };

        let staged_name = unique_file_name(self.staging_dir, &basename);
        if let Err(err) = copy_file(&resolved, &self.staging_dir.join(&staged_name)) {
            warn!(path = %resolved.display(), error = %err, "Failed to stage included file");
            return;
        }

        match &self.rule.included_default_name {
            Some(default_name) => entry.config_file_list.push(
                FileDescriptor::new(staged_name, default_name.clone(), ".", self.rule.file_type.clone())
                    .with_alias(alias.clone()),
            ),
            None => entry.complimentary_file_list.push(
                FileDescriptor::new(staged_name, basename, ".", self.rule.file_type.clone())
                    .with_alias(alias.clone()),
            ),
        }
        debug!(alias = %alias, path = %resolved.display(), "Staged included file");

        self.process(&resolved, entry);
    }
}

/// Unique captures of group 1 across all lines, in order of appearance.
///
/// Surrounding quotes and a trailing `;` are removed.
fn collect_captures(content: &str, re: &Regex) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for line in content.lines() {
        for caps in re.captures_iter(line) {
            let Some(raw) = caps.get(1) else {
                continue;
            };
            let cleaned = raw
                .as_str()
                .trim()
                .trim_end_matches(';')
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string();
            if !cleaned.is_empty() && !found.contains(&cleaned) {
                found.push(cleaned);
            }
        }
    }
    found
}

/// `name` if free in `dir`, otherwise `stem_1.ext`, `stem_2.ext`, …
pub fn unique_file_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, counter, extension);
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        counter += 1;
    }
}
