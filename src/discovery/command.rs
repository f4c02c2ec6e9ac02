//! Container descriptors and call-command inference
//!
//! When a config file is neither at its standard location nor recognisable by
//! name, the container's entrypoint often names it (`nginx -c /srv/web.conf`).
//! The command line and any local scripts it runs are scanned for paths.

use super::context::DiscoveryContext;
use crate::fs::reroot;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Subset of `docker inspect` output describing how a container starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    #[serde(rename = "Config", default)]
    pub config: ContainerConfig,
    #[serde(rename = "WorkingDir", default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(rename = "Entrypoint", default, deserialize_with = "string_or_list")]
    pub entrypoint: Vec<String>,
    #[serde(rename = "Cmd", default, deserialize_with = "string_or_list")]
    pub cmd: Vec<String>,
    #[serde(rename = "Env", default, deserialize_with = "string_or_list")]
    pub env: Vec<String>,
    #[serde(rename = "WorkingDir", default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<StringOrList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StringOrList::One(item)) => vec![item],
        Some(StringOrList::Many(items)) => items,
    })
}

impl ContainerDescriptor {
    /// Parses `docker inspect` output; a top-level array yields its first element
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        match value {
            serde_json::Value::Array(items) => match items.into_iter().next() {
                Some(first) => serde_json::from_value(first),
                None => Ok(Self::default()),
            },
            other => serde_json::from_value(other),
        }
    }

    pub fn with_command(entrypoint: &[&str], cmd: &[&str]) -> Self {
        Self {
            config: ContainerConfig {
                entrypoint: entrypoint.iter().map(|s| s.to_string()).collect(),
                cmd: cmd.iter().map(|s| s.to_string()).collect(),
                ..ContainerConfig::default()
            },
            working_dir: None,
        }
    }

    /// Entrypoint followed by command arguments
    pub fn command_line(&self) -> Vec<String> {
        self.config
            .entrypoint
            .iter()
            .chain(self.config.cmd.iter())
            .cloned()
            .collect()
    }

    /// `KEY=VALUE` pairs from `Config.Env`; entries without `=` map to an empty value
    pub fn env(&self) -> BTreeMap<String, String> {
        self.config
            .env
            .iter()
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (pair.clone(), String::new()),
            })
            .collect()
    }

    pub fn working_dir(&self) -> Option<&str> {
        self.config
            .working_dir
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .or_else(|| self.working_dir.as_deref().filter(|dir| !dir.is_empty()))
    }
}

/// Replaces `$VAR` and `${VAR}` with values from `env`, leaving unknown variables untouched
pub fn expand_env(text: &str, env: &BTreeMap<String, String>) -> String {
    let var_re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid regex");
    var_re
        .replace_all(text, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            match name.and_then(|n| env.get(n)) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Maps a path seen inside the container onto the scan root
pub fn locate(ctx: &DiscoveryContext, container: &ContainerDescriptor, path: &str) -> PathBuf {
    if path.starts_with('/') {
        return reroot(ctx.root(), Path::new(path));
    }
    let base = container.working_dir().unwrap_or("/");
    reroot(ctx.root(), &Path::new(base).join(path))
}

/// Finds a script named on the command line.
///
/// Bare names are looked up along the container's `PATH` first, then in its
/// working directory.
fn locate_script(ctx: &DiscoveryContext, container: &ContainerDescriptor, token: &str) -> Option<PathBuf> {
    let in_root = |path: &Path| ctx.resolve(path).map_or(false, |resolved| resolved.is_file());
    if !token.contains('/') {
        let env = container.env();
        let on_path = env
            .get("PATH")
            .into_iter()
            .flat_map(|value| value.split(':'))
            .filter(|dir| dir.starts_with('/'))
            .map(|dir| reroot(ctx.root(), &Path::new(dir).join(token)))
            .find(|candidate| in_root(candidate.as_path()));
        if on_path.is_some() {
            return on_path;
        }
    }
    let candidate = locate(ctx, container, token);
    in_root(candidate.as_path()).then_some(candidate)
}

/// The expanded command line plus the contents of local files it references.
///
/// Entrypoint scripts (`docker-entrypoint.sh`) usually hold the real invocation.
pub fn command_texts(ctx: &DiscoveryContext, container: &ContainerDescriptor) -> Vec<String> {
    let env = container.env();
    let arguments: Vec<String> = container
        .command_line()
        .iter()
        .map(|arg| expand_env(arg, &env))
        .collect();
    if arguments.is_empty() {
        return Vec::new();
    }

    let mut texts = vec![arguments.join(" ")];
    for argument in &arguments {
        for token in argument.split_whitespace() {
            if !token.contains('/') && !token.ends_with(".sh") {
                continue;
            }
            let Some(candidate) = locate_script(ctx, container, token) else {
                continue;
            };
            if let Some(script) = ctx.read_candidate(&candidate) {
                debug!(script = %token, "Scanning referenced script for config paths");
                texts.push(expand_env(&script, &env));
            }
        }
    }
    texts
}

/// Unique group-1 captures of `re` across `texts`, with surrounding quotes removed
pub fn capture_paths(texts: &[String], re: &Regex) -> Vec<String> {
    let mut found = Vec::new();
    for text in texts {
        for caps in re.captures_iter(text) {
            let Some(raw) = caps.get(1) else {
                continue;
            };
            let cleaned = raw
                .as_str()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string();
            if !cleaned.is_empty() && !found.contains(&cleaned) {
                found.push(cleaned);
            }
        }
    }
    found
}

/// Existing files under the scan root that the container's command points at
pub fn infer_paths(ctx: &DiscoveryContext, container: &ContainerDescriptor, re: &Regex) -> Vec<PathBuf> {
    let texts = command_texts(ctx, container);
    let mut paths: Vec<PathBuf> = Vec::new();
    for captured in capture_paths(&texts, re) {
        let candidate = locate(ctx, container, &captured);
        let exists = ctx
            .resolve(&candidate)
            .map(|resolved| resolved.is_file())
            .unwrap_or(false);
        if !exists {
            debug!(path = %captured, "Path from call command does not exist under root");
            continue;
        }
        if !paths.contains(&candidate) {
            paths.push(candidate);
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const INSPECT: &str = r#"[{
        "Id": "abc",
        "Config": {
            "Entrypoint": ["/docker-entrypoint.sh"],
            "Cmd": "nginx -g 'daemon off;'",
            "Env": ["PATH=/usr/bin", "CONF_DIR=/srv/conf", "EMPTY"],
            "WorkingDir": ""
        },
        "WorkingDir": "/srv"
    }]"#;

    #[test]
    fn test_from_json_accepts_inspect_array() {
        let container = ContainerDescriptor::from_json(INSPECT).unwrap();
        assert_eq!(
            container.command_line(),
            vec!["/docker-entrypoint.sh", "nginx -g 'daemon off;'"]
        );
        assert_eq!(container.env()["CONF_DIR"], "/srv/conf");
        assert_eq!(container.env()["EMPTY"], "");
        assert_eq!(container.working_dir(), Some("/srv"));
    }

    #[test]
    fn test_from_json_tolerates_nulls() {
        let container =
            ContainerDescriptor::from_json(r#"{"Config": {"Entrypoint": null, "Cmd": null}}"#).unwrap();
        assert!(container.command_line().is_empty());
        assert_eq!(container.working_dir(), None);
        assert_eq!(ContainerDescriptor::from_json("[]").unwrap(), ContainerDescriptor::default());
        assert!(ContainerDescriptor::from_json("not json").is_err());
    }

    #[test]
    fn test_expand_env() {
        let mut env = BTreeMap::new();
        env.insert("CONF_DIR".to_string(), "/srv/conf".to_string());
        assert_eq!(
            expand_env("-c ${CONF_DIR}/a.conf $CONF_DIR/b $MISSING", &env),
            "-c /srv/conf/a.conf /srv/conf/b $MISSING"
        );
    }

    #[test]
    fn test_infer_paths_from_entrypoint_script() {
        let root = TempDir::new().unwrap();
        let r = root.path();
        fs::create_dir_all(r.join("srv/conf")).unwrap();
        fs::write(
            r.join("docker-entrypoint.sh"),
            "#!/bin/sh\nexec redis-server \"$CONF_DIR/redis.conf\" \"$@\"\n",
        )
        .unwrap();
        fs::write(r.join("srv/conf/redis.conf"), "port 6379").unwrap();

        let ctx = DiscoveryContext::with_defaults(r);
        let container = ContainerDescriptor::from_json(INSPECT).unwrap();
        let re = Regex::new(r#"redis-server\s+"?(\S+?\.conf)"#).unwrap();

        assert_eq!(
            infer_paths(&ctx, &container, &re),
            vec![r.join("srv/conf/redis.conf")]
        );
    }

    #[test]
    fn test_relative_paths_use_working_dir() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("app")).unwrap();
        fs::write(root.path().join("app/haproxy.cfg"), "global").unwrap();

        let ctx = DiscoveryContext::with_defaults(root.path());
        let mut container = ContainerDescriptor::with_command(&["haproxy"], &["-f", "haproxy.cfg"]);
        container.config.working_dir = Some("/app".to_string());
        let re = Regex::new(r"-f\s+(\S+)").unwrap();

        assert_eq!(
            infer_paths(&ctx, &container, &re),
            vec![root.path().join("app/haproxy.cfg")]
        );
        assert_eq!(
            capture_paths(&["-f 'a.cfg' -f a.cfg".to_string()], &re),
            vec!["a.cfg".to_string()]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_linked_entrypoint_script_is_read() {
        let root = TempDir::new().unwrap();
        let r = root.path();
        fs::create_dir_all(r.join("usr/local/bin")).unwrap();
        fs::create_dir_all(r.join("srv/conf")).unwrap();
        fs::write(
            r.join("usr/local/bin/docker-entrypoint.sh"),
            "#!/bin/sh\nexec redis-server /srv/conf/redis.conf\n",
        )
        .unwrap();
        std::os::unix::fs::symlink("/usr/local/bin/docker-entrypoint.sh", r.join("docker-entrypoint.sh"))
            .unwrap();
        fs::write(r.join("srv/conf/redis.conf"), "port 6379").unwrap();

        let ctx = DiscoveryContext::with_defaults(r);
        let container = ContainerDescriptor::with_command(&["/docker-entrypoint.sh"], &["redis-server"]);
        let re = Regex::new(r#"redis-server\s+"?(\S+?\.conf)"#).unwrap();

        assert_eq!(
            infer_paths(&ctx, &container, &re),
            vec![r.join("srv/conf/redis.conf")]
        );
    }

    #[test]
    fn test_bare_script_name_is_found_on_path() {
        let root = TempDir::new().unwrap();
        let r = root.path();
        fs::create_dir_all(r.join("usr/local/bin")).unwrap();
        fs::create_dir_all(r.join("data")).unwrap();
        fs::create_dir_all(r.join("etc/redis")).unwrap();
        fs::write(
            r.join("usr/local/bin/docker-entrypoint.sh"),
            "#!/bin/sh\nexec redis-server /etc/redis/cache.conf \"$@\"\n",
        )
        .unwrap();
        fs::write(r.join("etc/redis/cache.conf"), "maxmemory 1gb").unwrap();

        let ctx = DiscoveryContext::with_defaults(r);
        let mut container = ContainerDescriptor::with_command(&["docker-entrypoint.sh"], &["redis-server"]);
        container.config.env = vec!["PATH=/usr/local/sbin:/usr/local/bin:/usr/bin".to_string()];
        container.config.working_dir = Some("/data".to_string());
        let re = Regex::new(r#"redis-server\s+"?(\S+?\.conf)"#).unwrap();

        assert_eq!(
            infer_paths(&ctx, &container, &re),
            vec![r.join("etc/redis/cache.conf")]
        );
    }
}
