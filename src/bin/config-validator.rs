//! # Relay Configuration Validator
//!
//! Command-line tool for validating relay configuration files per environment.
//! Catches unknown task types, missing executors and bad thresholds before a
//! core is started with them.

use clap::{Parser, Subcommand};
use relay_core::config::{ConfigManager, RelayConfig};
use relay_core::constants::{services, TaskType};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "relay-config-validator")]
#[command(about = "Validate relay configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment overlay to apply (development, test, production, ...)
    #[arg(short, long, env = "RELAY_ENV", default_value = "development")]
    environment: String,

    /// Configuration directory (default: $RELAY_CONFIG_DIR or ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate everything (default)
    All,

    /// List declared executors
    Executors,

    /// Show the effective routing table and flag unknown executor names
    Strategies,

    /// Print the fully merged configuration as JSON
    Dump,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = load(&cli).and_then(|manager| {
        let config = manager.config();
        match &cli.command {
            Some(Commands::All) | None => validate_all(config),
            Some(Commands::Executors) => list_executors(config),
            Some(Commands::Strategies) => show_strategies(config).map(|_| ()),
            Some(Commands::Dump) => dump(config),
        }
    });

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            eprintln!("❌ {e}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> Result<std::sync::Arc<ConfigManager>, Box<dyn std::error::Error>> {
    println!("🔧 Validating relay configuration");
    println!("Environment: {}", cli.environment);
    if let Some(config_dir) = &cli.config_dir {
        println!("Config Directory: {}", config_dir.display());
    }
    println!();

    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)?;
    println!(
        "✅ Loaded and validated {}",
        manager.config_directory().display()
    );
    Ok(manager)
}

fn validate_all(config: &RelayConfig) -> CliResult {
    list_executors(config)?;
    let unknown = show_strategies(config)?;

    println!("🏥 Health");
    println!(
        "   probe every {}s, timeout {}s, smoothing {} / {}",
        config.health.probe_interval_seconds,
        config.health.probe_timeout_seconds,
        config.health.success_smoothing,
        config.health.failure_smoothing
    );
    println!("📈 Monitor");
    println!(
        "   snapshot every {}s over {}s, {} metrics / {} snapshots / {} alerts retained",
        config.monitor.snapshot_interval_seconds,
        config.monitor.window_seconds,
        config.monitor.metrics_capacity,
        config.monitor.snapshot_capacity,
        config.monitor.alert_capacity
    );

    if unknown > 0 {
        // Undeclared names are skipped at routing time, so this is not fatal
        println!("⚠️  {unknown} strategy entries reference undeclared executors");
    }

    println!("\n🎉 All configuration validation checks passed!");
    Ok(())
}

fn list_executors(config: &RelayConfig) -> CliResult {
    println!("🧩 Executors ({})", config.executors.len());
    for executor in &config.executors {
        let network = if executor.offline_capable {
            "offline-capable"
        } else {
            "needs network"
        };
        println!(
            "   • {} [{}] {}ms, reliability {:.2}, {}: {}",
            executor.name,
            executor.kind,
            executor.avg_latency_ms,
            executor.reliability,
            network,
            executor.capabilities.join(", ")
        );
        if executor.kind != services::OFFLINE_KIND {
            println!("     ℹ️  kind '{}' needs a factory from the embedding application", executor.kind);
        }
    }
    println!();
    Ok(())
}

/// Returns the number of strategy entries naming undeclared executors
fn show_strategies(config: &RelayConfig) -> Result<usize, Box<dyn std::error::Error>> {
    println!("🧭 Routing strategies");
    let mut unknown = 0;

    for task_type in TaskType::ALL {
        match config.router.strategies.get(task_type.as_str()) {
            Some(names) => {
                let rendered: Vec<String> = names
                    .iter()
                    .map(|name| {
                        if config.executors.iter().any(|e| &e.name == name) {
                            name.clone()
                        } else {
                            unknown += 1;
                            warn!(task_type = task_type.as_str(), executor = %name, "Strategy references undeclared executor");
                            format!("{name} (undeclared)")
                        }
                    })
                    .collect();
                println!("   {:<18} → {}", task_type.as_str(), rendered.join(" → "));
            }
            None => println!(
                "   {:<18} → derived from executor capabilities",
                task_type.as_str()
            ),
        }
    }
    println!();
    Ok(unknown)
}

fn dump(config: &RelayConfig) -> CliResult {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
