use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::{debug, info};

use stratum_core::provider::Provider;
use stratum_core::timeouts::parse_duration;
use stratum_provider_aws::cloudcontrol::RequestProgress;
use stratum_provider_aws::{AwsProvider, ProviderConfig};

#[derive(Parser)]
#[command(name = "stratum")]
#[command(about = "Wait on long-running AWS control-plane operations", long_about = None)]
struct Cli {
    /// AWS region (e.g. eu-west-1 or aws.Region.eu_west_1)
    #[arg(long, global = true, default_value = "us-east-1")]
    region: String,

    /// Named profile from the shared AWS config files
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for a Cloud Control request to settle
    WaitRequest {
        /// Request token returned by CreateResource, UpdateResource or DeleteResource
        token: String,

        /// Give up after this long (e.g. "10m", "1h30m")
        #[arg(long, default_value = "10m", value_parser = parse_timeout)]
        timeout: Duration,
    },
    /// Wait for a Comprehend entity recognizer to reach a state
    WaitRecognizer {
        /// Entity recognizer ARN
        arn: String,

        /// State to wait for
        #[arg(long, value_enum)]
        until: RecognizerState,

        #[arg(long, default_value = "3h", value_parser = parse_timeout)]
        timeout: Duration,
    },
    /// List the resource types of the provider
    Types,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RecognizerState {
    Trained,
    Stopped,
    Deleted,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    match parse_duration(s) {
        Ok(d) if d.is_zero() => Err("timeout must be greater than zero".to_string()),
        Ok(d) => Ok(d),
        Err(e) => Err(e.to_string()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = ProviderConfig::new(&cli.region);
    if let Some(profile) = &cli.profile {
        config = config.with_profile(profile);
    }
    let provider = AwsProvider::new(&config).await;
    debug!("Using region {}", provider.region());

    // Ctrl-C cancels every wait in progress
    let cancel = provider.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::WaitRequest { token, timeout } => run_wait_request(&provider, &token, timeout).await,
        Commands::WaitRecognizer {
            arn,
            until,
            timeout,
        } => run_wait_recognizer(&provider, &arn, until, timeout).await,
        Commands::Types => {
            run_types(&provider);
            Ok(())
        }
    }
}

async fn run_wait_request(
    provider: &AwsProvider,
    token: &str,
    timeout: Duration,
) -> anyhow::Result<()> {
    println!("{} {}", "Waiting for request".cyan(), token);

    let progress = match provider.cloudcontrol().wait_for_request(token, timeout).await {
        Ok(progress) => progress,
        Err(failure) => {
            if let Some(last) = &failure.last_snapshot {
                println!("{}", "Last observed request:".yellow());
                println!("{}", render_progress(last)?);
            }
            return Err(anyhow::Error::new(failure.into_error())
                .context(format!("request {} did not succeed", token)));
        }
    };

    println!("{} {}", "✓".green(), progress.operation_status.green().bold());
    println!("{}", render_progress(&progress)?);
    Ok(())
}

fn render_progress(progress: &RequestProgress) -> anyhow::Result<String> {
    serde_json::to_string_pretty(progress).context("failed to render request")
}

async fn run_wait_recognizer(
    provider: &AwsProvider,
    arn: &str,
    until: RecognizerState,
    timeout: Duration,
) -> anyhow::Result<()> {
    println!("{} {} ({:?})", "Waiting for".cyan(), arn, until);
    let recognizers = provider.entity_recognizers();

    let recognizer = match until {
        RecognizerState::Trained => Some(recognizers.wait_trained(arn, timeout).await?),
        RecognizerState::Stopped => Some(recognizers.wait_stopped(arn, timeout).await?),
        RecognizerState::Deleted => {
            recognizers.wait_deleted(arn, timeout).await?;
            None
        }
    };

    match recognizer {
        Some(recognizer) => {
            println!("{} {}", "✓".green(), recognizer.status.green().bold());
            if let Some(message) = recognizer.message {
                println!("  {}", message.dimmed());
            }
        }
        None => println!("{} {}", "✓".green(), "deleted".green().bold()),
    }
    Ok(())
}

fn run_types(provider: &AwsProvider) {
    println!("{}", format!("Provider: {}", provider.name()).bold());
    for resource_type in provider.resource_types() {
        let timeouts = resource_type.timeouts();
        println!(
            "  {} (create {:?}, delete {:?})",
            resource_type.name().cyan(),
            timeouts.create,
            timeouts.delete
        );
    }
}
