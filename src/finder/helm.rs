use super::{Finder, ServiceId};
use crate::discovery::sniff::is_helm_chart;
use crate::discovery::staging::{build_single, stage_config_file, FindingTemplate};
use crate::discovery::{ConfigFileType, ContainerDescriptor, DefaultName, DiscoveryContext, StagedFinding};
use crate::fs::file_name;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Helm charts: `Chart.yaml` with its values files and templates, staged as one instance
pub struct HelmFinder {
    template: FindingTemplate,
    values_name: Regex,
}

impl HelmFinder {
    pub fn new() -> Self {
        Self {
            template: FindingTemplate::new(ServiceId::Helm.to_string(), ConfigFileType::Helm)
                .with_default_name(DefaultName::fixed("Chart.yaml")),
            values_name: Regex::new(r"^values[^/]*\.ya?ml$").expect("valid regex"),
        }
    }

    fn stage_chart(&self, ctx: &DiscoveryContext, chart_file: &Path) -> Option<StagedFinding> {
        let chart_dir = chart_file.parent()?;
        let mut finding = build_single(ctx, &self.template, chart_file)?;
        let templates_dir = chart_dir.join("templates");

        for file in ctx.files() {
            if file.parent() == Some(chart_dir) {
                let is_values = file_name(file)
                    .map(|name| self.values_name.is_match(&name))
                    .unwrap_or(false);
                if is_values {
                    stage_config_file(ctx, &mut finding, file, &DefaultName::basename(), &ConfigFileType::Yaml);
                }
            } else if file.starts_with(&templates_dir) {
                stage_config_file(ctx, &mut finding, file, &DefaultName::basename(), &ConfigFileType::Helm);
            }
        }

        debug!(
            chart = %chart_dir.display(),
            files = finding.entry.config_file_list.len(),
            "Staged Helm chart"
        );
        Some(finding)
    }
}

impl Default for HelmFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Finder for HelmFinder {
    fn service(&self) -> ServiceId {
        ServiceId::Helm
    }

    fn standard_location_search(&self, _ctx: &DiscoveryContext) -> Option<StagedFinding> {
        None
    }

    fn filesystem_search(&self, ctx: &DiscoveryContext) -> Vec<StagedFinding> {
        ctx.files()
            .iter()
            .filter(|path| file_name(path).as_deref() == Some("Chart.yaml"))
            .filter(|path| {
                ctx.read_candidate(path)
                    .map(|content| is_helm_chart(&content))
                    .unwrap_or(false)
            })
            .filter_map(|path| self.stage_chart(ctx, path))
            .collect()
    }

    fn call_command_search(
        &self,
        _ctx: &DiscoveryContext,
        _container: Option<&ContainerDescriptor>,
    ) -> Vec<StagedFinding> {
        Vec::new()
    }
}
