//! Per-service configuration finders
//!
//! Every supported service has a [`Finder`] that locates its configuration in
//! three tiers of decreasing confidence:
//!
//! 1. **Standard location**: the well-known path(s) the service reads by default
//! 2. **Filesystem search**: every file under the root whose path looks right
//! 3. **Call command**: paths named by the container's entrypoint and command
//!
//! Most services are plain data in [`catalog`] driven by [`CatalogFinder`];
//! services with cross-file relationships implement the trait directly.

pub mod catalog;
pub mod catalog_finder;
pub mod helm;
pub mod postgres;
pub mod registry;

pub use catalog::{catalog, IncludeSpec, ServiceSpec};
pub use catalog_finder::CatalogFinder;
pub use helm::HelmFinder;
pub use postgres::PostgresFinder;
pub use registry::FinderRegistry;

use crate::discovery::{ContainerDescriptor, DiscoveryContext, StagedFinding};
use tracing::{debug, warn};

crate::define_tag_enum! {
    /// Stable identifier of a supported service
    ServiceId {
        Nginx => "nginx",
        Apache => "apache",
        Tomcat => "tomcat",
        Mysql => "mysql",
        Postgresql => "postgresql",
        Mongodb => "mongodb",
        Redis => "redis",
        Elasticsearch => "elasticsearch",
        Kafka => "kafka",
        Zookeeper => "zookeeper",
        Rabbitmq => "rabbitmq",
        Haproxy => "haproxy",
        Memcached => "memcached",
        Sshd => "sshd",
        Kerberos => "kerberos",
        Sudoers => "sudoers",
        Php => "php",
        DockerDaemon => "docker_daemon",
        Dockerfile => "dockerfile",
        DockerCompose => "docker_compose",
        Kubernetes => "kubernetes",
        Helm => "helm",
        Terraform => "terraform",
        Cloudformation => "cloudformation",
        Ansible => "ansible",
        GithubActions => "github_actions",
        GitlabCi => "gitlab_ci",
        Jenkins => "jenkins",
        Systemd => "systemd",
    }
}

/// Locates and stages the configuration of one service
pub trait Finder: Send + Sync {
    fn service(&self) -> ServiceId;

    /// Name recorded as `serviceName` in manifest entries
    fn service_name(&self) -> String {
        self.service().to_string()
    }

    /// First hit at a well-known location, if any
    fn standard_location_search(&self, ctx: &DiscoveryContext) -> Option<StagedFinding>;

    /// Every instance found by walking the whole root
    fn filesystem_search(&self, ctx: &DiscoveryContext) -> Vec<StagedFinding>;

    /// Instances whose paths are named by the container's start command
    fn call_command_search(
        &self,
        ctx: &DiscoveryContext,
        container: Option<&ContainerDescriptor>,
    ) -> Vec<StagedFinding>;

    /// Runs the three tiers, stopping at the first that finds anything
    fn find(
        &self,
        ctx: &DiscoveryContext,
        container: Option<&ContainerDescriptor>,
    ) -> Vec<StagedFinding> {
        three_tier_search(self, ctx, container)
    }
}

/// Standard location, then filesystem search, then call-command inference.
///
/// Later tiers only run when earlier ones found nothing. Hits from the two
/// heuristic tiers are reported as warnings since they may be false positives.
pub fn three_tier_search<F: Finder + ?Sized>(
    finder: &F,
    ctx: &DiscoveryContext,
    container: Option<&ContainerDescriptor>,
) -> Vec<StagedFinding> {
    let service = finder.service_name();

    if let Some(finding) = finder.standard_location_search(ctx) {
        debug!(service = %service, "Found configuration at standard location");
        return vec![finding];
    }

    let found = finder.filesystem_search(ctx);
    if !found.is_empty() {
        warn!(
            service = %service,
            count = found.len(),
            "Configuration found by filesystem search, not at a standard location"
        );
        return found;
    }

    let found = finder.call_command_search(ctx, container);
    if !found.is_empty() {
        warn!(
            service = %service,
            count = found.len(),
            "Configuration inferred from the container call command"
        );
    }
    found
}
