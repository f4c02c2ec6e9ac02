use super::catalog::ServiceSpec;
use super::{Finder, ServiceId};
use crate::discovery::command::infer_paths;
use crate::discovery::staging::{build_grouped, build_single, FindingTemplate};
use crate::discovery::{
    group_by_subpath, resolve_includes, ContainerDescriptor, DiscoveryContext, DiscoveryError,
    IncludeRule, StagedFinding,
};
use crate::fs::glob;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Finder interpreting a [`ServiceSpec`]
pub struct CatalogFinder {
    spec: ServiceSpec,
    template: FindingTemplate,
    file_patterns: Vec<Regex>,
    include_rule: Option<IncludeRule>,
    call_command: Option<Regex>,
}

impl CatalogFinder {
    /// Compiles the service's patterns, failing on the first invalid one
    pub fn new(spec: ServiceSpec) -> Result<Self, DiscoveryError> {
        let file_patterns = spec
            .file_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| DiscoveryError::invalid_pattern(*p, e)))
            .collect::<Result<Vec<_>, _>>()?;
        let include_rule = spec
            .includes
            .as_ref()
            .map(|includes| includes.to_rule(spec.file_type.clone()))
            .transpose()?;
        let call_command = spec
            .call_command
            .map(|p| Regex::new(p).map_err(|e| DiscoveryError::invalid_pattern(p, e)))
            .transpose()?;
        let template = FindingTemplate::new(spec.id.to_string(), spec.file_type.clone())
            .with_version(spec.version)
            .with_default_name(spec.default_name.clone());

        Ok(Self {
            spec,
            template,
            file_patterns,
            include_rule,
            call_command,
        })
    }

    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }

    fn sniff_passes(&self, ctx: &DiscoveryContext, path: &Path) -> bool {
        match self.spec.sniff {
            None => true,
            Some(sniff) => ctx
                .read_candidate(path)
                .map(|content| sniff(&content))
                .unwrap_or(false),
        }
    }

    /// Files under the root whose relative path matches a file pattern and whose content sniffs right
    fn candidates(&self, ctx: &DiscoveryContext) -> Vec<PathBuf> {
        ctx.files()
            .iter()
            .filter(|path| {
                ctx.relative(path)
                    .map(|rel| self.file_patterns.iter().any(|re| re.is_match(&rel)))
                    .unwrap_or(false)
            })
            .filter(|path| self.sniff_passes(ctx, path))
            .cloned()
            .collect()
    }

    fn standard_matches(&self, ctx: &DiscoveryContext) -> Vec<PathBuf> {
        self.spec
            .standard_paths
            .iter()
            .flat_map(|pattern| glob::expand(ctx.root(), pattern))
            .filter(|path| !resolves_to_dir(ctx, path))
            .filter(|path| self.sniff_passes(ctx, path))
            .collect()
    }

    /// Pulls in files included by each staged config file
    fn with_includes(&self, ctx: &DiscoveryContext, mut finding: StagedFinding) -> StagedFinding {
        if let Some(rule) = &self.include_rule {
            let StagedFinding {
                entry,
                staging,
                sources,
            } = &mut finding;
            for source in sources.iter() {
                resolve_includes(ctx, source, staging.path(), entry, rule);
            }
        }
        finding
    }

    fn stage_all(&self, ctx: &DiscoveryContext, files: &[PathBuf]) -> Vec<StagedFinding> {
        let findings = if self.spec.grouped {
            build_grouped(ctx, &self.template, &group_by_subpath(ctx.root(), files))
        } else {
            files
                .iter()
                .filter_map(|file| build_single(ctx, &self.template, file))
                .collect()
        };
        findings
            .into_iter()
            .map(|finding| self.with_includes(ctx, finding))
            .collect()
    }
}

/// Directories are judged after resolving links inside the root
fn resolves_to_dir(ctx: &DiscoveryContext, path: &Path) -> bool {
    ctx.resolve(path).map(|p| p.is_dir()).unwrap_or(false)
}

impl Finder for CatalogFinder {
    fn service(&self) -> ServiceId {
        self.spec.id.clone()
    }

    fn standard_location_search(&self, ctx: &DiscoveryContext) -> Option<StagedFinding> {
        if self.spec.grouped {
            let matches = self.standard_matches(ctx);
            if matches.is_empty() {
                return None;
            }
            let mut groups = BTreeMap::new();
            groups.insert(String::new(), matches);
            return build_grouped(ctx, &self.template, &groups)
                .into_iter()
                .next()
                .map(|finding| self.with_includes(ctx, finding));
        }

        for pattern in self.spec.standard_paths {
            for path in glob::expand(ctx.root(), pattern) {
                if resolves_to_dir(ctx, &path) || !self.sniff_passes(ctx, &path) {
                    continue;
                }
                if let Some(finding) = build_single(ctx, &self.template, &path) {
                    return Some(self.with_includes(ctx, finding));
                }
            }
        }
        None
    }

    fn filesystem_search(&self, ctx: &DiscoveryContext) -> Vec<StagedFinding> {
        if self.file_patterns.is_empty() {
            return Vec::new();
        }
        let candidates = self.candidates(ctx);
        debug!(service = %self.spec.id, candidates = candidates.len(), "Filesystem search");
        self.stage_all(ctx, &candidates)
    }

    fn call_command_search(
        &self,
        ctx: &DiscoveryContext,
        container: Option<&ContainerDescriptor>,
    ) -> Vec<StagedFinding> {
        let (Some(container), Some(re)) = (container, &self.call_command) else {
            return Vec::new();
        };
        let paths = infer_paths(ctx, container, re);
        self.stage_all(ctx, &paths)
    }
}
