use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Discover service configuration files in a filesystem image
#[derive(Parser, Debug)]
#[command(
    name = "confscout",
    about = "Discover service configuration files in a filesystem image",
    version,
    author,
    long_about = "confscout walks a mounted filesystem or unpacked container image, finds the \
                  configuration files of known services (nginx, redis, postgresql, kubernetes \
                  manifests and more), follows their includes and stages them into a \
                  collection directory with a JSON manifest."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        help = "Configuration file (defaults to <config dir>/confscout/config.toml)"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Collect configuration files under a root directory",
        long_about = "Runs every registered finder against ROOT and writes the staged files \
                      and manifest.json into a new collection directory.\n\n\
                      Examples:\n  \
                      confscout collect /mnt/image\n  \
                      confscout collect /mnt/image --instance-id web-01 --format json\n  \
                      confscout collect ./rootfs --container ./inspect.json"
    )]
    Collect(CollectArgs),

    #[command(about = "List the services confscout can discover")]
    Services(ServicesArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct CollectArgs {
    #[arg(value_name = "ROOT", help = "Root of the filesystem to scan")]
    pub root: PathBuf,

    #[arg(
        short = 'i',
        long,
        value_name = "ID",
        help = "Machine identifier used in the manifest (defaults to a random UUID)"
    )]
    pub instance_id: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Container descriptor (docker inspect JSON) used to infer paths from the start command"
    )]
    pub container: Option<PathBuf>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Directory in which the collection is created"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ServicesArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
