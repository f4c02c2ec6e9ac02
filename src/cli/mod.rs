pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, CollectArgs, Commands, ServicesArgs};
pub use output::{OutputFormat, OutputFormatter};
