//! `run` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use config_loader::{diagnose, ConfigLoader};
use contracts::AcquisitionConfig;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::host::{HostConfig, HostLoop};

/// Execute the `run` command
pub async fn run_acquisition(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut config, args);

    for diagnostic in diagnose(&config) {
        warn!(label = %diagnostic.label, "{}", diagnostic.message);
    }

    info!(
        sources = config.sources.len(),
        active = config.active_sources().count(),
        max_entries = config.global.max_entries,
        stagger_ms = config.global.launch_stagger_ms,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let host = HostLoop::new(HostConfig {
        acquisition: config,
        drain_interval: Duration::from_millis(args.drain_interval_ms),
        session_duration: (args.duration_secs > 0).then(|| Duration::from_secs(args.duration_secs)),
        sessions: args.sessions,
    });

    info!(sessions = args.sessions, "Starting acquisition...");
    let stats = host.run(shutdown_signal()).await?;

    info!(
        sessions = stats.sessions_completed,
        records = stats.drains.total_records,
        dropped = stats.dropped_records(),
        failed_workers = stats.failed_workers(),
        duration_secs = stats.duration.as_secs_f64(),
        "Acquisition finished"
    );
    stats.print_summary();

    Ok(())
}

/// Apply CLI overrides on top of the file's global section
fn apply_overrides(config: &mut AcquisitionConfig, args: &RunArgs) {
    if let Some(max_entries) = args.max_entries {
        info!(max_entries, "Overriding max_entries from CLI");
        config.global.max_entries = max_entries as usize;
    }
    if let Some(stagger_ms) = args.stagger_ms {
        info!(stagger_ms, "Overriding time_between_launches from CLI");
        config.global.launch_stagger_ms = stagger_ms;
    }
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves; the run then ends
/// by duration only.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &AcquisitionConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Global:");
    println!("  Rawlog prefix: {}", config.global.rawlog_prefix);
    println!("  Max entries: {}", config.global.max_entries);
    println!("  Launch stagger: {} ms", config.global.launch_stagger_ms);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        let marker = if source.is_launchable() { "" } else { " [ignored]" };
        println!(
            "  - {} ({}) @ {} Hz{}",
            source.label, source.driver_kind, source.poll_rate_hz, marker
        );
    }

    println!();
}
