//! `agent` and `sample` commands - the device side

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::AgentConfig;
use crate::device::{
    AgentSettings, DeviceStateSampler, InputLine, Level, MonitorAgent, MonotonicClock, MqttPublisher, PayloadBuilder,
    ScriptedLine, StatusPayload, SysfsLine,
};

/// Level a stub input line reports instead of the GPIO pin
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StubLevel {
    /// Pump running (active-low)
    Low,
    /// Pump stopped
    High,
}

impl From<StubLevel> for Level {
    fn from(level: StubLevel) -> Self {
        match level {
            StubLevel::Low => Level::Low,
            StubLevel::High => Level::High,
        }
    }
}

/// `agent` command arguments
#[derive(Args)]
pub struct AgentArgs {
    /// Device config file (defaults to $HEATING_MONITOR_CONFIG or ~/.config/heating-monitor/iot_config.json)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Read a fixed level instead of the GPIO pin
    #[arg(long, value_enum)]
    pub stub_level: Option<StubLevel>,
}

/// `sample` command arguments
#[derive(Args)]
pub struct SampleArgs {
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub stub_level: Option<StubLevel>,

    /// Frame the payload as a heartbeat
    #[arg(long)]
    pub heartbeat: bool,

    /// metadata.reason for non-heartbeat payloads
    #[arg(long, default_value = "event_change")]
    pub reason: String,
}

fn resolve_config_path(arg: Option<PathBuf>) -> PathBuf {
    arg.or_else(|| std::env::var_os("HEATING_MONITOR_CONFIG").map(PathBuf::from))
        .unwrap_or_else(AgentConfig::default_path)
}

fn build_sampler(config: &AgentConfig, stub: Option<StubLevel>) -> Result<DeviceStateSampler> {
    let line: Box<dyn InputLine> = match stub {
        Some(level) => {
            info!(level = ?level, "Using stub input line");
            Box::new(ScriptedLine::fixed(level.into()))
        }
        None => Box::new(
            SysfsLine::open(&config.gpio_root, config.gpio_pin)
                .with_context(|| format!("cannot open GPIO {}", config.gpio_pin))?,
        ),
    };
    Ok(DeviceStateSampler::new(line))
}

/// Resolve when `signal` fires; a signal that cannot be registered never resolves
async fn wait_for_signal<F, E>(signal: F)
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Cannot listen for Ctrl-C; agent will run until killed");
            std::future::pending::<()>().await;
        }
    }
}

/// Run the device agent until Ctrl-C
pub async fn handle_agent(args: AgentArgs) -> Result<()> {
    let path = resolve_config_path(args.config);
    let config = AgentConfig::load(&path)?;
    info!(path = %path.display(), thing_name = %config.thing_name, "Loaded device config");

    let sampler = build_sampler(&config, args.stub_level)?;
    let publisher = MqttPublisher::connect(&config)?;
    let mut agent = MonitorAgent::new(AgentSettings::from(&config), sampler, publisher, Arc::new(MonotonicClock::new()));

    agent.run(wait_for_signal(tokio::signal::ctrl_c())).await?;

    agent.publisher().disconnect().await;
    Ok(())
}

/// Sample once and build the payload without publishing
pub fn handle_sample(args: SampleArgs) -> Result<StatusPayload> {
    let config = AgentConfig::load(resolve_config_path(args.config))?;
    let sampler = build_sampler(&config, args.stub_level)?;
    let status = sampler.sample()?;

    let clock = MonotonicClock::new();
    let builder = PayloadBuilder::new(&config.thing_name, &config.location, &clock);
    Ok(if args.heartbeat {
        builder.heartbeat(status)
    } else {
        builder.event(status, &args.reason)
    })
}
