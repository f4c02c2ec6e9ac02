use confscout::cli::commands::{CliArgs, Commands};
use confscout::cli::handlers::{handle_collect, handle_services};
use confscout::config::ConfscoutConfig;
use confscout::util::{init_logging, parse_level, LoggingConfig};
use confscout::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();

    let config = match ConfscoutConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging_from_args(&args, &config);

    debug!("confscout v{} starting", VERSION);
    debug!("Arguments: {:?}", args);
    debug!("{}", config);

    let exit_code = match &args.command {
        Commands::Collect(collect_args) => handle_collect(collect_args, &config),
        Commands::Services(services_args) => handle_services(services_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, config: &ConfscoutConfig) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&config.log_level)
    };

    init_logging(LoggingConfig {
        level,
        ..LoggingConfig::from_env()
    });
}
