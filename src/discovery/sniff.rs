//! Content predicates for telling generic formats apart
//!
//! A `.yaml` file may be a Kubernetes manifest, a Compose file or an Ansible
//! playbook. Finders attach a `fn(&str) -> bool` predicate to decide. Malformed
//! content never matches.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

/// Content predicate attached to a service definition
pub type Sniff = fn(&str) -> bool;

fn yaml_documents(content: &str) -> Vec<YamlValue> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        match YamlValue::deserialize(document) {
            Ok(value) => documents.push(value),
            Err(_) => return Vec::new(),
        }
    }
    documents
}

fn yaml_mapping_has(value: &YamlValue, key: &str) -> bool {
    value
        .as_mapping()
        .map(|m| m.contains_key(&YamlValue::String(key.to_string())))
        .unwrap_or(false)
}

/// True if some YAML document is a mapping holding every key in `keys`
pub fn yaml_has_keys(content: &str, keys: &[&str]) -> bool {
    yaml_documents(content)
        .iter()
        .any(|doc| keys.iter().all(|key| yaml_mapping_has(doc, key)))
}

/// True if some YAML document is a mapping holding at least one key in `keys`
pub fn yaml_has_any_key(content: &str, keys: &[&str]) -> bool {
    yaml_documents(content)
        .iter()
        .any(|doc| keys.iter().any(|key| yaml_mapping_has(doc, key)))
}

/// True if the content is a JSON object holding every key in `keys`
pub fn json_has_keys(content: &str, keys: &[&str]) -> bool {
    match serde_json::from_str::<JsonValue>(content) {
        Ok(JsonValue::Object(map)) => keys.iter().all(|key| map.contains_key(*key)),
        _ => false,
    }
}

pub fn json_is_object(content: &str) -> bool {
    matches!(serde_json::from_str::<JsonValue>(content), Ok(JsonValue::Object(_)))
}

/// True if the content is well-formed XML whose root element is `name`
pub fn xml_root_is(content: &str, name: &str) -> bool {
    roxmltree::Document::parse(content)
        .map(|doc| doc.root_element().tag_name().name() == name)
        .unwrap_or(false)
}

pub fn is_kubernetes_manifest(content: &str) -> bool {
    yaml_has_keys(content, &["apiVersion", "kind"])
}

pub fn is_helm_chart(content: &str) -> bool {
    yaml_has_keys(content, &["apiVersion", "name", "version"])
}

pub fn is_docker_compose(content: &str) -> bool {
    yaml_has_keys(content, &["services"])
}

pub fn is_github_workflow(content: &str) -> bool {
    yaml_has_keys(content, &["on", "jobs"])
}

/// CloudFormation templates in YAML or JSON
pub fn is_cloudformation_template(content: &str) -> bool {
    const MARKERS: &[&str] = &["AWSTemplateFormatVersion"];
    if json_has_keys(content, MARKERS) || yaml_has_any_key(content, MARKERS) {
        return true;
    }
    // Templates without the version marker still declare AWS:: resource types
    content.contains("AWS::")
        && (json_has_keys(content, &["Resources"]) || yaml_has_keys(content, &["Resources"]))
}

/// A playbook is a YAML list of plays, at least one of which targets `hosts`
pub fn is_ansible_playbook(content: &str) -> bool {
    yaml_documents(content).iter().any(|doc| {
        doc.as_sequence()
            .map(|plays| plays.iter().any(|play| yaml_mapping_has(play, "hosts")))
            .unwrap_or(false)
    })
}

pub fn is_tomcat_server_xml(content: &str) -> bool {
    xml_root_is(content, "Server")
}

pub fn is_docker_daemon_config(content: &str) -> bool {
    json_is_object(content)
}
