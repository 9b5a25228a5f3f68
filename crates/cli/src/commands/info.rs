//! `info` command implementation.

use std::collections::BTreeMap;

use acquisition::{SessionNaming, SourceRegistry};
use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{AcquisitionConfig, ParamValue};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    global: GlobalInfo,
    session_preview: SessionInfo,
    sources: Vec<SourceInfo>,
    drivers: Vec<String>,
}

#[derive(Serialize)]
struct GlobalInfo {
    rawlog_prefix: String,
    max_entries: usize,
    time_between_launches_ms: u64,
    shutdown_grace_ms: u64,
    external_storage: bool,
}

#[derive(Serialize)]
struct SessionInfo {
    rawlog_filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_storage_dir: Option<String>,
}

#[derive(Serialize)]
struct SourceInfo {
    label: String,
    driver: String,
    process_rate: f64,
    launched: bool,
    driver_registered: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, ParamValue>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config, &SourceRegistry::default(), args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(
    config: &AcquisitionConfig,
    registry: &SourceRegistry,
    args: &InfoArgs,
) -> ConfigInfo {
    let global = &config.global;
    let naming = SessionNaming::now(&global.rawlog_prefix);

    let sources = config
        .sources
        .iter()
        .map(|s| SourceInfo {
            label: s.label.clone(),
            driver: s.driver_kind.clone(),
            process_rate: s.poll_rate_hz,
            launched: s.is_launchable(),
            driver_registered: registry.contains(&s.driver_kind),
            params: if args.params {
                s.params.clone()
            } else {
                BTreeMap::new()
            },
        })
        .collect();

    ConfigInfo {
        global: GlobalInfo {
            rawlog_prefix: global.rawlog_prefix.clone(),
            max_entries: global.max_entries,
            time_between_launches_ms: global.launch_stagger_ms,
            shutdown_grace_ms: global.shutdown_grace_ms,
            external_storage: global.external_storage,
        },
        session_preview: SessionInfo {
            rawlog_filename: naming.rawlog_filename,
            external_storage_dir: global
                .external_storage
                .then(|| naming.external_storage_dir.display().to_string()),
        },
        sources,
        drivers: registry.kinds().map(str::to_string).collect(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== Acquisition Configuration ===\n");

    let global = &info.global;
    println!("Global");
    println!("   ├─ Rawlog prefix: {}", global.rawlog_prefix);
    println!("   ├─ Max entries: {}", global.max_entries);
    println!("   ├─ Launch stagger: {} ms", global.time_between_launches_ms);
    println!("   ├─ Shutdown grace: {} ms", global.shutdown_grace_ms);
    println!("   └─ External storage: {}", global.external_storage);

    println!("\nNext session");
    println!("   ├─ Rawlog: {}", info.session_preview.rawlog_filename);
    match &info.session_preview.external_storage_dir {
        Some(dir) => println!("   └─ External storage: {}", dir),
        None => println!("   └─ External storage: disabled"),
    }

    println!("\nSources ({})", info.sources.len());
    for (i, source) in info.sources.iter().enumerate() {
        let is_last = i == info.sources.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        let mut flags = Vec::new();
        if !source.launched {
            flags.push("ignored");
        }
        if !source.driver_registered {
            flags.push("unknown driver");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        println!(
            "   {} {} ({}, {} Hz){}",
            prefix, source.label, source.driver, source.process_rate, flags
        );
        for (key, value) in &source.params {
            println!("   {}     {} = {:?}", child_prefix, key, value);
        }
    }

    println!("\nRegistered drivers: {}", info.drivers.join(", "));
    println!();
}
