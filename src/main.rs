//! Heating monitor CLI
//!
//! Device agent for the pump input and the alert dispatcher for the cloud side

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use heating_monitor::cli::{
    format_output, handle_agent, handle_dispatch, handle_sample, AgentArgs, DispatchArgs, SampleArgs,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "hmon")]
#[command(about = "Heating monitor - watch the boiler pump and alert when it stops")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the device agent: sample the pump and publish status over MQTT
    Agent(AgentArgs),
    /// Sample once and print the payload that would be published
    Sample {
        #[command(flatten)]
        args: SampleArgs,
        /// Print compact single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Dispatch one alert event to every configured channel
    Dispatch {
        #[command(flatten)]
        args: DispatchArgs,
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("heating_monitor=info,hmon=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Agent(args) => {
            info!("Starting device agent");
            handle_agent(args).await?;
            info!("Device agent stopped");
        }
        Commands::Sample { args, compact } => {
            let payload = handle_sample(args)?;
            println!("{}", format_output(&payload, !compact));
        }
        Commands::Dispatch { args, compact } => {
            // Channel clients are blocking; keep them off the async workers
            let outcome = tokio::task::spawn_blocking(move || handle_dispatch(args))
                .await
                .map_err(|e| anyhow!("dispatch task failed: {}", e))?;
            match outcome {
                Ok(outcome) => println!("{}", format_output(&outcome, !compact)),
                Err(e) => {
                    error!(error = %e, "Dispatch failed");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
