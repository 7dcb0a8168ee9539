//! Command line tool that prints the normalized bin collection schedule for a
//! property, once or on a recurring trigger.

mod output;
mod trigger;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use binday_core::{
    AppConfig, BindayService, CouncilId, CouncilPlugin, CouncilRegistry, PropertyRef,
    load_app_config,
};
use binday_provider_york as york;
use chrono::Local;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Client;
use tokio::{signal, time};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::trigger::{DailyWindow, Scheduler, Trigger};

#[derive(Debug, Parser)]
#[command(name = "binday", version)]
#[command(about = "Print the normalized bin collection schedule for a property as JSON")]
struct Cli {
    /// Unique Property Reference Number (UPRN) of the address.
    uprn: String,

    /// Council whose API serves the property.
    #[arg(long, env = "BINDAY_COUNCIL", default_value = "york")]
    council: String,

    /// Refresh once a day at a random local time inside this window, e.g. 06:00-09:00.
    #[arg(long, conflicts_with = "interval_secs")]
    daily_window: Option<DailyWindow>,

    /// Refresh every N seconds, starting immediately.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: Option<u64>,
}

impl Cli {
    fn trigger(&self) -> Trigger {
        match (self.daily_window, self.interval_secs) {
            (Some(window), _) => Trigger::Daily(window),
            (None, Some(secs)) => Trigger::Interval(StdDuration::from_secs(secs)),
            (None, None) => Trigger::Once,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_app_config().context("invalid configuration")?;
    init_logging(&config.log_level)?;

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(StdDuration::from_secs(config.request_timeout_secs))
        .build()?;

    let york_plugin = match &config.api_url {
        Some(url) => york::plugin_with_api_url(client, url.as_str()),
        None => york::plugin(client),
    };
    let plugins = vec![configure(york_plugin, &config)?];
    let registry = Arc::new(CouncilRegistry::new(plugins));
    let service = BindayService::new(registry);

    let council = CouncilId(cli.council.clone());
    let property = PropertyRef(cli.uprn.clone());

    let mut scheduler = Scheduler::new(cli.trigger());
    let mut rng = StdRng::from_os_rng();

    while let Some(delay) = scheduler.next_delay(Local::now().naive_local(), &mut rng) {
        if !delay.is_zero() {
            info!(
                delay_secs = delay.as_secs(),
                %council,
                %property,
                "next collection refresh scheduled"
            );
            tokio::select! {
                () = time::sleep(delay) => {}
                _ = signal::ctrl_c() => {
                    info!("interrupted, stopping");
                    break;
                }
            }
        }

        match refresh(&service, &council, &property).await {
            Ok(()) => {}
            Err(err) if scheduler.is_periodic() => {
                warn!("collection refresh failed: {err:#}");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

fn init_logging(log_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_err| EnvFilter::try_new(log_level))?;
    // stdout carries the JSON document only
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn configure(plugin: CouncilPlugin, config: &AppConfig) -> Result<CouncilPlugin> {
    let normalizer = config
        .apply_to(&plugin.normalizer)
        .with_context(|| format!("invalid overrides for council {}", plugin.meta.id))?;
    Ok(plugin.with_normalizer(normalizer))
}

/// Fetch, normalize, and print one schedule.
async fn refresh(
    service: &BindayService,
    council: &CouncilId,
    property: &PropertyRef,
) -> Result<()> {
    let schedule = service
        .collections_for(council, property)
        .await
        .with_context(|| {
            format!("failed to load collections for UPRN {property} from {council}")
        })?;

    let text = output::render(&schedule).context("failed to encode schedule")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}")?;
    stdout.flush()?;
    Ok(())
}
