//! Every built-in finder against a minimal filesystem image
//!
//! Services with well-known locations must be found there; the rest must be
//! found by the filesystem-wide search.

mod support;

use confscout::{DiscoveryContext, FinderRegistry, ServiceId};
use std::fs;
use support::write_file;
use tempfile::TempDir;
use yare::parameterized;

#[parameterized(
    nginx = { "nginx", "etc/nginx/nginx.conf", "events {}\n", "nginx.conf" },
    apache = { "apache", "etc/httpd/conf/httpd.conf", "Listen 80\n", "httpd.conf" },
    tomcat = { "tomcat", "usr/local/tomcat/conf/server.xml", "<Server port=\"8005\"/>", "server.xml" },
    mysql = { "mysql", "etc/mysql/my.cnf", "[mysqld]\n", "my.cnf" },
    mongodb = { "mongodb", "etc/mongod.conf", "net:\n  port: 27017\n", "mongod.conf" },
    redis = { "redis", "etc/redis/redis.conf", "port 6379\n", "redis.conf" },
    elasticsearch = { "elasticsearch", "etc/elasticsearch/elasticsearch.yml", "cluster.name: c\n", "elasticsearch.yml" },
    kafka = { "kafka", "opt/kafka/config/server.properties", "broker.id=0\n", "server.properties" },
    zookeeper = { "zookeeper", "etc/zookeeper/conf/zoo.cfg", "tickTime=2000\n", "zoo.cfg" },
    rabbitmq = { "rabbitmq", "etc/rabbitmq/rabbitmq.conf", "listeners.tcp.default = 5672\n", "rabbitmq.conf" },
    haproxy = { "haproxy", "etc/haproxy/haproxy.cfg", "global\n", "haproxy.cfg" },
    memcached = { "memcached", "etc/memcached.conf", "-m 64\n", "memcached.conf" },
    sshd = { "sshd", "etc/ssh/sshd_config", "PermitRootLogin no\n", "sshd_config" },
    kerberos = { "kerberos", "etc/krb5.conf", "[libdefaults]\n", "krb5.conf" },
    sudoers = { "sudoers", "etc/sudoers", "root ALL=(ALL) ALL\n", "sudoers" },
    php = { "php", "etc/php/8.2/fpm/php.ini", "memory_limit = 128M\n", "php.ini" },
    docker_daemon = { "docker_daemon", "etc/docker/daemon.json", "{\"debug\": true}", "daemon.json" },
    postgresql = { "postgresql", "etc/postgresql/16/main/postgresql.conf", "port = 5432\n", "postgresql.conf" },
    systemd = { "systemd", "etc/systemd/system/worker@1.service", "[Unit]\n", "worker@.service" },
)]
fn test_standard_location(service: &str, rel: &str, content: &str, default_name: &str) {
    let root = TempDir::new().unwrap();
    write_file(root.path(), rel, content);
    let ctx = DiscoveryContext::with_defaults(root.path());
    let registry = FinderRegistry::with_defaults();
    let finder = registry.get(&ServiceId::from_tag(service)).unwrap();

    let finding = finder.standard_location_search(&ctx).unwrap();

    let descriptor = &finding.entry.config_file_list[0];
    let (sub_path, file_name) = rel.rsplit_once('/').unwrap();
    assert_eq!(finding.entry.service_name, service);
    assert_eq!(descriptor.file_name, file_name);
    assert_eq!(descriptor.sub_path, sub_path);
    assert_eq!(descriptor.default_file_name, default_name);
    assert_eq!(
        fs::read_to_string(finding.staging_path().join(rel)).unwrap(),
        content
    );
}

#[parameterized(
    dockerfile = { "dockerfile", "app/Dockerfile", "FROM alpine:3.19\n" },
    docker_compose = { "docker_compose", "app/docker-compose.yml", "services:\n  web:\n    image: nginx\n" },
    kubernetes = { "kubernetes", "deploy/service.yaml", "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n" },
    terraform = { "terraform", "infra/main.tf", "resource \"aws_s3_bucket\" \"b\" {}\n" },
    cloudformation = { "cloudformation", "cfn/stack.yaml", "AWSTemplateFormatVersion: '2010-09-09'\nResources: {}\n" },
    ansible = { "ansible", "playbooks/site.yml", "- hosts: all\n  tasks: []\n" },
    github_actions = { "github_actions", ".github/workflows/ci.yml", "on: push\njobs:\n  build:\n    runs-on: ubuntu-latest\n" },
    gitlab_ci = { "gitlab_ci", "repo/.gitlab-ci.yml", "stages: [build]\n" },
    jenkins = { "jenkins", "repo/Jenkinsfile", "pipeline {}\n" },
    helm = { "helm", "charts/web/Chart.yaml", "apiVersion: v2\nname: web\nversion: 0.1.0\n" },
)]
fn test_filesystem_search(service: &str, rel: &str, content: &str) {
    let root = TempDir::new().unwrap();
    write_file(root.path(), rel, content);
    let ctx = DiscoveryContext::with_defaults(root.path());
    let registry = FinderRegistry::with_defaults();
    let finder = registry.get(&ServiceId::from_tag(service)).unwrap();

    assert!(finder.standard_location_search(&ctx).is_none());
    let found = finder.find(&ctx, None);

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].service_name(), service);
    assert!(found[0].staging_path().join(rel).is_file());
}

#[test]
fn test_sniffing_keeps_finders_apart() {
    let root = TempDir::new().unwrap();
    write_file(
        root.path(),
        "stack/compose.yaml",
        "services:\n  db:\n    image: postgres\n",
    );
    write_file(
        root.path(),
        "stack/pod.yaml",
        "apiVersion: v1\nkind: Pod\nmetadata:\n  name: db\n",
    );
    let ctx = DiscoveryContext::with_defaults(root.path());
    let registry = FinderRegistry::with_defaults();

    let mut hits: Vec<(String, String)> = registry
        .finders()
        .iter()
        .flat_map(|finder| finder.find(&ctx, None))
        .flat_map(|finding| {
            let service = finding.entry.service_name.clone();
            finding
                .entry
                .config_file_list
                .iter()
                .map(|d| (service.clone(), d.file_name.clone()))
                .collect::<Vec<_>>()
        })
        .collect();
    hits.sort();

    assert_eq!(
        hits,
        vec![
            ("docker_compose".to_string(), "compose.yaml".to_string()),
            ("kubernetes".to_string(), "pod.yaml".to_string()),
        ]
    );
}
