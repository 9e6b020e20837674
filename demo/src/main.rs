//! ratekit demo
//!
//! Look up live rates, convert amounts, and run a quick end-to-end check
//! against the configured rate endpoints.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ratekit_common::Money;
use ratekit_fx::{CurrencyHandle, CurrencyRegistry, FxConfig, FxEngine};

mod check;

/// ratekit demo CLI
#[derive(Parser, Debug)]
#[command(name = "ratekit-demo")]
#[command(about = "Currency rate lookup and conversion demo")]
struct Args {
    /// Base currency amounts are denominated in
    #[arg(short, long, global = true)]
    base: Option<String>,

    /// Margin percentage applied to conversions (e.g. 3.5)
    #[arg(short, long, global = true)]
    margin: Option<Decimal>,

    /// Cache TTL in minutes
    #[arg(long, global = true)]
    ttl: Option<u64>,

    /// Serve cached rates only, never touch the network
    #[arg(long, global = true)]
    offline: bool,

    /// Endpoint template with {base} or {BASE}; repeat to add fallbacks
    #[arg(long = "endpoint", global = true)]
    endpoints: Vec<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show engine configuration and cache status
    Status,

    /// Show current rates for the given codes (all registered codes if none)
    Rates { codes: Vec<String> },

    /// Convert an amount of the base currency into each code
    Convert {
        amount: Decimal,
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Run the live conversion, margin, and base-change checks
    Check,
}

impl Args {
    fn config(&self) -> anyhow::Result<FxConfig> {
        let mut config = FxConfig::from_env();

        if let Some(base) = &self.base {
            config.base_currency = base.parse()?;
        }
        if let Some(margin) = self.margin {
            config.margin_percent = margin;
        }
        if let Some(ttl) = self.ttl {
            config.cache_ttl_minutes = ttl;
        }
        if self.offline {
            config.offline_mode = true;
        }
        if !self.endpoints.is_empty() {
            config.endpoints = self.endpoints.clone();
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = args.config()?;
    debug!(?config, "Loaded configuration");
    let engine = FxEngine::with_http(config)?;

    match &args.command {
        Command::Status => {
            // Populate the cache so the status reflects a real fetch.
            if let Err(e) = engine.rates().await {
                info!(error = %e, "Could not fetch rates");
            }
            let status = engine.status().await;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{}", status);
            }
        }
        Command::Rates { codes } => {
            let handles = resolve(codes)?;
            for handle in &handles {
                println!("{}", handle.describe(&engine).await);
            }
        }
        Command::Convert { amount, codes } => {
            let handles = resolve(codes)?;
            let base = engine.base_currency();
            for handle in &handles {
                let conversion = handle.convert_detailed(&engine, *amount).await?;
                if args.json {
                    println!("{}", serde_json::to_string(&conversion)?);
                } else {
                    println!(
                        "{} = {}",
                        Money::new(*amount, base.clone()),
                        conversion.output.round()
                    );
                }
            }
        }
        Command::Check => {
            let mut stdout = std::io::stdout();
            let report = check::run(&engine, &mut stdout).await?;
            info!(checked = report.checked, missing = report.missing.len(), "Check complete");
        }
    }

    Ok(())
}

/// Map codes to handles, preferring registry entries; empty means every registered code.
fn resolve(codes: &[String]) -> anyhow::Result<Vec<CurrencyHandle>> {
    let registry = CurrencyRegistry::global();
    if codes.is_empty() {
        return Ok(registry.iter().cloned().collect());
    }

    codes
        .iter()
        .map(|code| Ok(registry.handle(code)?))
        .collect()
}
