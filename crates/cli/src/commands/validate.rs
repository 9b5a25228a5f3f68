//! `validate` command implementation.

use acquisition::SourceRegistry;
use anyhow::{Context, Result};
use config_loader::{diagnose, ConfigLoader};
use contracts::AcquisitionConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<SourceWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

/// Non-fatal problem of one source section
#[derive(Debug, Serialize, PartialEq)]
struct SourceWarning {
    label: String,
    message: String,
}

#[derive(Serialize)]
struct ConfigSummary {
    source_count: usize,
    active_count: usize,
    max_entries: usize,
    launch_stagger_ms: u64,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match ConfigLoader::load_from_path(&args.config) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config, &SourceRegistry::default()),
            summary: Some(ConfigSummary {
                source_count: config.sources.len(),
                active_count: config.active_sources().count(),
                max_entries: config.global.max_entries,
                launch_stagger_ms: config.global.launch_stagger_ms,
            }),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Per-source problems: loader diagnostics plus unregistered drivers
fn collect_warnings(config: &AcquisitionConfig, registry: &SourceRegistry) -> Vec<SourceWarning> {
    let mut warnings: Vec<SourceWarning> = diagnose(config)
        .into_iter()
        .map(|d| SourceWarning {
            label: d.label,
            message: d.message,
        })
        .collect();

    for source in config.active_sources() {
        if !source.driver_kind.is_empty() && !registry.contains(&source.driver_kind) {
            warnings.push(SourceWarning {
                label: source.label.clone(),
                message: format!("driver '{}' is not registered", source.driver_kind),
            });
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Sources: {} ({} active)", summary.source_count, summary.active_count);
            println!("  Max entries: {}", summary.max_entries);
            println!("  Launch stagger: {} ms", summary.launch_stagger_ms);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - [{}] {}", warning.label, warning.message);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
