//! Built-in service definitions
//!
//! Each [`ServiceSpec`] describes where a service keeps its configuration and how
//! to recognise it. File patterns are regexes over the root-relative POSIX path;
//! standard paths are absolute paths inside the scanned filesystem and may
//! contain `*` for versioned directories.

use super::ServiceId;
use crate::discovery::sniff::{self, Sniff};
use crate::discovery::{ConfigFileType, DefaultName, DiscoveryError, IncludeRule};

/// Include directive syntax of a service's config format
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeSpec {
    pub single: &'static str,
    pub directory: Option<&'static str>,
    pub suffix: Option<&'static str>,
    pub included_default_name: Option<&'static str>,
}

impl IncludeSpec {
    pub const fn single(pattern: &'static str) -> Self {
        Self {
            single: pattern,
            directory: None,
            suffix: None,
            included_default_name: None,
        }
    }

    pub const fn directory(mut self, pattern: &'static str, suffix: Option<&'static str>) -> Self {
        self.directory = Some(pattern);
        self.suffix = suffix;
        self
    }

    pub fn to_rule(&self, file_type: ConfigFileType) -> Result<IncludeRule, DiscoveryError> {
        let mut rule = IncludeRule::new(self.single, file_type)?;
        if let Some(directory) = self.directory {
            rule = rule.with_directory(directory)?;
        }
        if let Some(suffix) = self.suffix {
            rule = rule.with_suffix(suffix)?;
        }
        if let Some(name) = self.included_default_name {
            rule = rule.with_included_default_name(name);
        }
        Ok(rule)
    }
}

/// Data-only description of a service, interpreted by `CatalogFinder`
#[derive(Debug, Clone)]
pub struct ServiceSpec {
    pub id: ServiceId,
    pub version: &'static str,
    pub default_name: DefaultName,
    pub file_type: ConfigFileType,
    pub standard_paths: &'static [&'static str],
    pub file_patterns: &'static [&'static str],
    pub sniff: Option<Sniff>,
    pub includes: Option<IncludeSpec>,
    /// Regex over the call command; group 1 is the config path
    pub call_command: Option<&'static str>,
    /// All matching files of one directory tree form a single instance
    pub grouped: bool,
}

impl ServiceSpec {
    pub fn new(id: ServiceId, file_type: ConfigFileType, default_name: &str) -> Self {
        Self {
            id,
            version: "",
            default_name: DefaultName::fixed(default_name),
            file_type,
            standard_paths: &[],
            file_patterns: &[],
            sniff: None,
            includes: None,
            call_command: None,
            grouped: false,
        }
    }

    /// Multi-file service whose files keep their own names
    pub fn grouped(id: ServiceId, file_type: ConfigFileType) -> Self {
        Self {
            default_name: DefaultName::basename(),
            grouped: true,
            ..Self::new(id, file_type, "")
        }
    }

    pub fn standard_paths(mut self, paths: &'static [&'static str]) -> Self {
        self.standard_paths = paths;
        self
    }

    pub fn file_patterns(mut self, patterns: &'static [&'static str]) -> Self {
        self.file_patterns = patterns;
        self
    }

    pub fn sniff(mut self, sniff: Sniff) -> Self {
        self.sniff = Some(sniff);
        self
    }

    pub fn includes(mut self, includes: IncludeSpec) -> Self {
        self.includes = Some(includes);
        self
    }

    pub fn call_command(mut self, pattern: &'static str) -> Self {
        self.call_command = Some(pattern);
        self
    }

    pub fn default_name(mut self, default_name: DefaultName) -> Self {
        self.default_name = default_name;
        self
    }
}

/// Collapses systemd instance units onto their template (`getty@tty1.service` → `getty@.service`)
pub fn systemd_template_name(name: &str) -> String {
    match (name.find('@'), name.rfind('.')) {
        (Some(at), Some(dot)) if at < dot => format!("{}{}", &name[..=at], &name[dot..]),
        _ => name.to_string(),
    }
}

/// Every table-driven service, in registration order
pub fn catalog() -> Vec<ServiceSpec> {
    vec![
        ServiceSpec::new(ServiceId::Nginx, ConfigFileType::Nginx, "nginx.conf")
            .standard_paths(&[
                "/etc/nginx/nginx.conf",
                "/usr/local/nginx/conf/nginx.conf",
                "/usr/local/etc/nginx/nginx.conf",
                "/opt/nginx/conf/nginx.conf",
            ])
            .file_patterns(&[r"(^|/)nginx\.conf$"])
            .includes(IncludeSpec::single(r"(?:^|[{;])\s*include\s+([^;#]+);"))
            .call_command(r"nginx\s+(?:\S+\s+)*?-c\s+(\S+)"),
        ServiceSpec::new(ServiceId::Apache, ConfigFileType::Apache, "httpd.conf")
            .standard_paths(&[
                "/etc/apache2/apache2.conf",
                "/etc/httpd/conf/httpd.conf",
                "/usr/local/apache2/conf/httpd.conf",
                "/usr/local/etc/apache24/httpd.conf",
            ])
            .file_patterns(&[r"(^|/)(httpd|apache2)\.conf$"])
            .includes(IncludeSpec::single(r#"(?i)^\s*Include(?:Optional)?\s+("[^"]+"|\S+)"#))
            .call_command(r"(?:httpd|apache2)\s+(?:\S+\s+)*?-f\s+(\S+)"),
        ServiceSpec::new(ServiceId::Tomcat, ConfigFileType::Xml, "server.xml")
            .standard_paths(&[
                "/usr/local/tomcat/conf/server.xml",
                "/opt/tomcat/conf/server.xml",
                "/etc/tomcat/server.xml",
                "/etc/tomcat*/server.xml",
            ])
            .file_patterns(&[r"(^|/)conf/server\.xml$", r"(^|/)tomcat[^/]*/server\.xml$"])
            .sniff(sniff::is_tomcat_server_xml),
        ServiceSpec::new(ServiceId::Mysql, ConfigFileType::Ini, "my.cnf")
            .standard_paths(&[
                "/etc/mysql/my.cnf",
                "/etc/my.cnf",
                "/usr/local/mysql/etc/my.cnf",
                "/usr/local/etc/my.cnf",
            ])
            .file_patterns(&[r"(^|/)my\.cnf$"])
            .includes(
                IncludeSpec::single(r"^\s*!include\s+(\S+)")
                    .directory(r"^\s*!includedir\s+(\S+)", Some(r"\.cnf")),
            )
            .call_command(r"--defaults(?:-extra)?-file=(\S+)"),
        ServiceSpec::new(ServiceId::Mongodb, ConfigFileType::Yaml, "mongod.conf")
            .standard_paths(&["/etc/mongod.conf", "/etc/mongodb.conf", "/usr/local/etc/mongod.conf"])
            .file_patterns(&[r"(^|/)mongod(b)?\.conf$"])
            .call_command(r"mongod\s+(?:\S+\s+)*?(?:--config|-f)[\s=]+(\S+)"),
        ServiceSpec::new(ServiceId::Redis, ConfigFileType::Redis, "redis.conf")
            .standard_paths(&[
                "/etc/redis/redis.conf",
                "/etc/redis.conf",
                "/usr/local/etc/redis/redis.conf",
                "/usr/local/etc/redis.conf",
            ])
            .file_patterns(&[r"(^|/)redis\.conf$"])
            .includes(IncludeSpec::single(r"^\s*include\s+(\S+)"))
            .call_command(r#"redis-server\s+"?([^\s"]+\.conf)"#),
        ServiceSpec::new(ServiceId::Elasticsearch, ConfigFileType::Yaml, "elasticsearch.yml")
            .standard_paths(&[
                "/etc/elasticsearch/elasticsearch.yml",
                "/usr/share/elasticsearch/config/elasticsearch.yml",
            ])
            .file_patterns(&[r"(^|/)elasticsearch\.ya?ml$"]),
        ServiceSpec::new(ServiceId::Kafka, ConfigFileType::Properties, "server.properties")
            .standard_paths(&[
                "/opt/kafka/config/server.properties",
                "/etc/kafka/server.properties",
                "/usr/local/kafka/config/server.properties",
            ])
            .file_patterns(&[r"(^|/)kafka[^/]*/(config/)?server\.properties$"])
            .call_command(r"kafka-server-start(?:\.sh)?\s+(\S+\.properties)"),
        ServiceSpec::new(ServiceId::Zookeeper, ConfigFileType::Properties, "zoo.cfg")
            .standard_paths(&[
                "/etc/zookeeper/conf/zoo.cfg",
                "/opt/zookeeper/conf/zoo.cfg",
                "/conf/zoo.cfg",
            ])
            .file_patterns(&[r"(^|/)zoo\.cfg$"])
            .call_command(r"zkServer\.sh\s+\S+\s+(\S+\.cfg)"),
        ServiceSpec::new(ServiceId::Rabbitmq, ConfigFileType::Conf, "rabbitmq.conf")
            .standard_paths(&["/etc/rabbitmq/rabbitmq.conf"])
            .file_patterns(&[r"(^|/)rabbitmq\.conf$"]),
        ServiceSpec::new(ServiceId::Haproxy, ConfigFileType::Haproxy, "haproxy.cfg")
            .standard_paths(&["/etc/haproxy/haproxy.cfg", "/usr/local/etc/haproxy/haproxy.cfg"])
            .file_patterns(&[r"(^|/)haproxy\.cfg$"])
            .call_command(r"haproxy\s+(?:\S+\s+)*?-f\s+(\S+)"),
        ServiceSpec::new(ServiceId::Memcached, ConfigFileType::Conf, "memcached.conf")
            .standard_paths(&["/etc/memcached.conf"])
            .file_patterns(&[r"(^|/)memcached\.conf$"]),
        ServiceSpec::new(ServiceId::Sshd, ConfigFileType::Sshd, "sshd_config")
            .standard_paths(&["/etc/ssh/sshd_config"])
            .file_patterns(&[r"(^|/)sshd_config$"])
            .includes(IncludeSpec::single(r"(?i)^\s*Include\s+(\S+)"))
            .call_command(r"sshd\s+(?:\S+\s+)*?-f\s+(\S+)"),
        ServiceSpec::new(ServiceId::Kerberos, ConfigFileType::Krb, "krb5.conf")
            .standard_paths(&["/etc/krb5.conf", "/etc/krb5/krb5.conf"])
            .file_patterns(&[r"(^|/)krb5\.conf$"])
            .includes(
                IncludeSpec::single(r"^\s*include\s+(\S+)")
                    .directory(r"^\s*includedir\s+(\S+)", None),
            ),
        ServiceSpec::new(ServiceId::Sudoers, ConfigFileType::Sudoers, "sudoers")
            .standard_paths(&["/etc/sudoers"])
            .file_patterns(&[r"(^|/)etc/sudoers$"])
            .includes(
                IncludeSpec::single(r"^\s*[@#]include\s+(\S+)")
                    .directory(r"^\s*[@#]includedir\s+(\S+)", None),
            ),
        ServiceSpec::new(ServiceId::Php, ConfigFileType::Ini, "php.ini")
            .standard_paths(&[
                "/usr/local/etc/php/php.ini",
                "/etc/php.ini",
                "/etc/php/*/fpm/php.ini",
                "/etc/php/*/apache2/php.ini",
                "/etc/php/*/cli/php.ini",
            ])
            .file_patterns(&[r"(^|/)php\.ini$"])
            .call_command(r"-c\s+(\S*php\.ini)"),
        ServiceSpec::new(ServiceId::DockerDaemon, ConfigFileType::Json, "daemon.json")
            .standard_paths(&["/etc/docker/daemon.json"])
            .file_patterns(&[r"(^|/)etc/docker/daemon\.json$"])
            .sniff(sniff::is_docker_daemon_config)
            .call_command(r"dockerd\s+(?:\S+\s+)*?--config-file[\s=]+(\S+)"),
        ServiceSpec::new(ServiceId::Dockerfile, ConfigFileType::Dockerfile, "Dockerfile")
            .file_patterns(&[r"(^|/)Dockerfile(\.[^/]+)?$", r"(^|/)[^/]+\.Dockerfile$"]),
        ServiceSpec::new(ServiceId::DockerCompose, ConfigFileType::Yaml, "docker-compose.yml")
            .file_patterns(&[r"(^|/)(docker-)?compose(\.[^/]+)?\.ya?ml$"])
            .sniff(sniff::is_docker_compose),
        ServiceSpec::grouped(ServiceId::Kubernetes, ConfigFileType::Yaml)
            .file_patterns(&[r"\.ya?ml$"])
            .sniff(sniff::is_kubernetes_manifest),
        ServiceSpec::grouped(ServiceId::Terraform, ConfigFileType::Hcl2)
            .file_patterns(&[r"\.tf$", r"\.tfvars$"]),
        ServiceSpec::grouped(ServiceId::Cloudformation, ConfigFileType::Yaml)
            .file_patterns(&[r"\.(ya?ml|json|template)$"])
            .sniff(sniff::is_cloudformation_template),
        ServiceSpec::grouped(ServiceId::Ansible, ConfigFileType::Yaml)
            .file_patterns(&[r"\.ya?ml$"])
            .sniff(sniff::is_ansible_playbook),
        ServiceSpec::grouped(ServiceId::GithubActions, ConfigFileType::Yaml)
            .file_patterns(&[r"(^|/)\.github/workflows/[^/]+\.ya?ml$"])
            .sniff(sniff::is_github_workflow),
        ServiceSpec::new(ServiceId::GitlabCi, ConfigFileType::Yaml, ".gitlab-ci.yml")
            .file_patterns(&[r"(^|/)\.gitlab-ci\.ya?ml$"]),
        ServiceSpec::new(ServiceId::Jenkins, ConfigFileType::Groovy, "Jenkinsfile")
            .file_patterns(&[r"(^|/)Jenkinsfile$"]),
        ServiceSpec::grouped(ServiceId::Systemd, ConfigFileType::Systemd)
            .standard_paths(&[
                "/etc/systemd/system/*.service",
                "/etc/systemd/system/*.socket",
                "/etc/systemd/system/*.timer",
            ])
            .file_patterns(&[r"(^|/)(etc|lib|usr/lib)/systemd/system/[^/]+\.(service|socket|timer)$"])
            .default_name(DefaultName::Derived(systemd_template_name)),
    ]
}
