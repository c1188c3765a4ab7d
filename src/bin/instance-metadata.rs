//! CLI binary for the instance-metadata crate.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use instance_metadata::{
    CloudMetadata, InstanceMetadata, MetadataConfig, MetadataError, Platform, UnavailableError,
    AWS_BASE_URL, GCP_BASE_URL,
};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "instance-metadata")]
#[command(
    author,
    version,
    about = "Detect the cloud platform and fetch instance metadata"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// AWS instance metadata service base URL
    #[arg(long, global = true, env = "INSTANCE_METADATA_AWS_URL", default_value = AWS_BASE_URL)]
    aws_url: String,

    /// GCP metadata server base URL
    #[arg(long, global = true, env = "INSTANCE_METADATA_GCP_URL", default_value = GCP_BASE_URL)]
    gcp_url: String,

    /// Connect and read timeout per request, in seconds
    #[arg(long, global = true, env = "INSTANCE_METADATA_TIMEOUT_SECS", default_value_t = 2)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the current cloud platform
    Detect,

    /// Fetch normalized instance metadata
    Fetch {
        /// Explicitly specify the platform instead of auto-detecting
        #[arg(short, long)]
        platform: Option<Platform>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown format: {}", s)),
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Setup(#[from] MetadataError),

    #[error(transparent)]
    Unavailable(#[from] UnavailableError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a tracing subscriber is already installed");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = MetadataConfig::default()
        .with_aws_base_url(&cli.aws_url)
        .with_gcp_base_url(&cli.gcp_url)
        .with_timeout(Duration::from_secs(cli.timeout));

    match cli.command {
        Commands::Detect => {
            let metadata = CloudMetadata::new(config)?;
            println!("{}", metadata.platform().await);
            Ok(())
        }

        Commands::Fetch { platform, format } => {
            let metadata = match platform {
                Some(platform) => CloudMetadata::with_platform(config, platform)?,
                None => CloudMetadata::new(config)?,
            };
            let instance = metadata.get_metadata().await?;

            match format {
                OutputFormat::Text => print_text(&instance),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&instance)?);
                }
            }
            Ok(())
        }
    }
}

fn print_text(instance: &InstanceMetadata) {
    println!("platform:     {}", instance.platform);
    println!("instance-id:  {}", instance.instance_id);
    println!("region:       {}", instance.region);
    println!("machine-type: {}", instance.machine_type);
    for (index, interface) in instance.network_interfaces.iter().enumerate() {
        println!(
            "interface {}: private={} public={} network={}",
            index,
            interface.private_ip.as_deref().unwrap_or("-"),
            interface.public_ip.as_deref().unwrap_or("-"),
            interface.network.as_deref().unwrap_or("-"),
        );
    }
}
