use super::commands::{CollectArgs, ServicesArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::collector::Collector;
use crate::config::ConfscoutConfig;
use crate::discovery::ContainerDescriptor;
use crate::finder::FinderRegistry;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, error};
use uuid::Uuid;

/// Runs `collect`; returns the process exit code
pub fn handle_collect(args: &CollectArgs, config: &ConfscoutConfig) -> i32 {
    match run_collect(args, config) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            error!("Collection failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_collect(args: &CollectArgs, config: &ConfscoutConfig) -> Result<String> {
    let container = args
        .container
        .as_deref()
        .map(load_container)
        .transpose()?;

    let mut collector = Collector::from_config(config);
    if let Some(output) = &args.output {
        collector = collector.with_output_dir(output.clone());
    }

    let instance_id = args
        .instance_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    debug!(instance_id = %instance_id, root = %args.root.display(), "Starting collection");

    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    let collection = collector
        .collect(&args.root, &instance_id, container.as_ref())
        .with_context(|| format!("Failed to collect configuration from {}", args.root.display()))?;

    match collection {
        Some(collection) => formatter.format_collection(&collection),
        None => formatter.format_empty(&args.root),
    }
}

fn load_container(path: &Path) -> Result<ContainerDescriptor> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read container descriptor {}", path.display()))?;
    ContainerDescriptor::from_json(&text)
        .with_context(|| format!("Invalid container descriptor {}", path.display()))
}

/// Runs `services`; returns the process exit code
pub fn handle_services(args: &ServicesArgs) -> i32 {
    let registry = FinderRegistry::with_defaults();
    let formatter = OutputFormatter::new(OutputFormat::from(args.format));

    match formatter.format_services(&registry.service_names()) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}
