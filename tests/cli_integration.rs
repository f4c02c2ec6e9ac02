//! CLI integration tests
//!
//! These run the compiled binary and check output formats and exit codes.

mod support;

use std::path::Path;
use std::process::{Command, Output};
use support::{confscout_bin, write_file};
use tempfile::TempDir;

fn run(args: &[&str], config_home: &Path) -> Output {
    Command::new(confscout_bin())
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("CONFSCOUT_LOG_LEVEL")
        .env_remove("CONFSCOUT_OUTPUT_DIR")
        .env_remove("CONFSCOUT_MAX_FILE_SIZE")
        .env_remove("CONFSCOUT_MAX_SYMLINK_DEPTH")
        .output()
        .expect("Failed to execute confscout")
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    let output = run(&["--help"], home.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("collect"));
    assert!(stdout.contains("services"));
}

#[test]
fn test_services_json() {
    let home = TempDir::new().unwrap();
    let output = run(&["services", "--format", "json"], home.path());

    assert!(output.status.success());
    let services: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(services.len(), 29);
    assert!(services.contains(&"postgresql".to_string()));
    assert!(services.contains(&"helm".to_string()));
}

#[test]
fn test_collect_json_output() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    write_file(root.path(), "etc/haproxy/haproxy.cfg", "global\n  maxconn 100\n");
    let out = TempDir::new().unwrap();

    let output = run(
        &[
            "-q",
            "collect",
            root.path().to_str().unwrap(),
            "--instance-id",
            "lb-1",
            "--output",
            out.path().to_str().unwrap(),
            "--format",
            "json",
        ],
        home.path(),
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let collection = value["collection"].as_str().unwrap();
    assert!(Path::new(collection).starts_with(out.path()));
    assert!(Path::new(collection).join("manifest.json").is_file());
    assert_eq!(
        value["manifest"]["machines"]["lb-1"]["services"]["haproxy_0"]["serviceName"],
        "haproxy"
    );
}

#[test]
fn test_collect_nothing_found_exits_zero() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    write_file(root.path(), "notes.txt", "hello\n");
    let out = TempDir::new().unwrap();

    let output = run(
        &[
            "collect",
            root.path().to_str().unwrap(),
            "--output",
            out.path().to_str().unwrap(),
        ],
        home.path(),
    );

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No service configuration found"));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_collect_missing_root_fails() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let missing = root.path().join("missing");

    let output = run(&["collect", missing.to_str().unwrap()], home.path());

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}

#[test]
fn test_invalid_config_file_fails() {
    let home = TempDir::new().unwrap();
    let config = write_file(home.path(), "bad.toml", "max_symlink_depth = \"deep\"\n");

    let output = run(
        &["--config", config.to_str().unwrap(), "services"],
        home.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid config file"));
}
