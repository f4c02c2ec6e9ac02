//! PostgreSQL: `postgresql.conf` plus the `pg_hba.conf` it points at
//!
//! The server config names its authentication file through `hba_file`; when the
//! setting is absent the file sits next to `postgresql.conf`. Both are staged as
//! config files of the same instance.

use super::{Finder, ServiceId};
use crate::discovery::command::{capture_paths, command_texts, locate};
use crate::discovery::staging::{build_single, stage_config_file, FindingTemplate};
use crate::discovery::{
    resolve_includes, ConfigFileType, ContainerDescriptor, DefaultName, DiscoveryContext,
    DiscoveryError, IncludeRule, StagedFinding,
};
use crate::fs::{glob, reroot};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

const STANDARD_PATHS: &[&str] = &[
    "/etc/postgresql/*/main/postgresql.conf",
    "/var/lib/postgresql/data/postgresql.conf",
    "/var/lib/pgsql/data/postgresql.conf",
    "/var/lib/pgsql/*/data/postgresql.conf",
    "/usr/local/pgsql/data/postgresql.conf",
];

const CONF_NAME: &str = "postgresql.conf";
const HBA_NAME: &str = "pg_hba.conf";

pub struct PostgresFinder {
    template: FindingTemplate,
    includes: IncludeRule,
    file_pattern: Regex,
    hba_setting: Regex,
    config_file_arg: Regex,
    data_dir_arg: Regex,
}

impl PostgresFinder {
    pub fn new() -> Result<Self, DiscoveryError> {
        let compile = |p: &str| Regex::new(p).map_err(|e| DiscoveryError::invalid_pattern(p, e));
        Ok(Self {
            template: FindingTemplate::new(ServiceId::Postgresql.to_string(), ConfigFileType::Postgresql)
                .with_default_name(DefaultName::fixed(CONF_NAME)),
            includes: IncludeRule::new(
                r"^\s*include(?:_if_exists)?\s*=?\s*'([^']+)'",
                ConfigFileType::Postgresql,
            )?
            .with_directory(r"^\s*include_dir\s*=?\s*'([^']+)'")?
            .with_suffix(r"\.conf")?,
            file_pattern: compile(r"(^|/)postgresql\.conf$")?,
            hba_setting: compile(r"(?m)^\s*hba_file\s*=\s*'?([^'\s#]+)'?")?,
            config_file_arg: compile(r"config_file=(\S+)")?,
            data_dir_arg: compile(r"(?:^|\s)-D\s*(\S+)")?,
        })
    }

    /// `hba_file` target if it exists, otherwise the sibling `pg_hba.conf`
    fn hba_for(&self, ctx: &DiscoveryContext, conf: &Path, content: &str) -> Option<PathBuf> {
        let dir = conf.parent()?;
        let configured = self.hba_setting.captures(content).map(|caps| {
            let value = &caps[1];
            if value.starts_with('/') {
                reroot(ctx.root(), Path::new(value))
            } else {
                dir.join(value)
            }
        });

        if let Some(path) = configured {
            if is_file_in_root(ctx, &path) {
                return Some(path);
            }
            debug!(path = %path.display(), "Configured hba_file not found, trying sibling");
        }
        let sibling = dir.join(HBA_NAME);
        is_file_in_root(ctx, &sibling).then_some(sibling)
    }

    fn stage(&self, ctx: &DiscoveryContext, conf: &Path) -> Option<StagedFinding> {
        let mut finding = build_single(ctx, &self.template, conf)?;
        let source = finding.sources.first()?.clone();

        // A linked postgresql.conf still looks for its sibling next to the link
        if let Some(content) = ctx.read_candidate(conf) {
            if let Some(hba) = self.hba_for(ctx, conf, &content) {
                stage_config_file(
                    ctx,
                    &mut finding,
                    &hba,
                    &DefaultName::fixed(HBA_NAME),
                    &ConfigFileType::PgHba,
                );
            }
        }

        let StagedFinding { entry, staging, .. } = &mut finding;
        resolve_includes(ctx, &source, staging.path(), entry, &self.includes);
        Some(finding)
    }

    /// Config paths named by `-c config_file=…`, `-D <datadir>` or `PGDATA`
    fn command_candidates(&self, ctx: &DiscoveryContext, container: &ContainerDescriptor) -> Vec<PathBuf> {
        let texts = command_texts(ctx, container);
        let mut candidates: Vec<PathBuf> = capture_paths(&texts, &self.config_file_arg)
            .iter()
            .map(|p| locate(ctx, container, p))
            .collect();
        candidates.extend(
            capture_paths(&texts, &self.data_dir_arg)
                .iter()
                .map(|dir| locate(ctx, container, dir).join(CONF_NAME)),
        );
        if let Some(pgdata) = container.env().get("PGDATA") {
            candidates.push(locate(ctx, container, pgdata).join(CONF_NAME));
        }

        let mut unique = Vec::new();
        for candidate in candidates {
            if is_file_in_root(ctx, &candidate) && !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        unique
    }
}

fn is_file_in_root(ctx: &DiscoveryContext, path: &Path) -> bool {
    ctx.resolve(path).map_or(false, |resolved| resolved.is_file())
}

impl Finder for PostgresFinder {
    fn service(&self) -> ServiceId {
        ServiceId::Postgresql
    }

    fn standard_location_search(&self, ctx: &DiscoveryContext) -> Option<StagedFinding> {
        STANDARD_PATHS
            .iter()
            .flat_map(|pattern| glob::expand(ctx.root(), pattern))
            .find_map(|path| self.stage(ctx, &path))
    }

    fn filesystem_search(&self, ctx: &DiscoveryContext) -> Vec<StagedFinding> {
        ctx.files()
            .iter()
            .filter(|path| {
                ctx.relative(path)
                    .map(|rel| self.file_pattern.is_match(&rel))
                    .unwrap_or(false)
            })
            .filter_map(|path| self.stage(ctx, path))
            .collect()
    }

    fn call_command_search(
        &self,
        ctx: &DiscoveryContext,
        container: Option<&ContainerDescriptor>,
    ) -> Vec<StagedFinding> {
        let Some(container) = container else {
            return Vec::new();
        };
        self.command_candidates(ctx, container)
            .iter()
            .filter_map(|path| self.stage(ctx, path))
            .collect()
    }
}
