//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{SecurityMode, TranscriptConfig};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    name: String,
    output_template: String,
    subject: String,
    skip_if_empty: bool,
    max_buffered_lines: Option<usize>,
    endpoint: String,
    security: SecurityMode,
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
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    name: config.name.clone(),
                    output_template: config.output_template.clone(),
                    subject: config.subject.clone(),
                    skip_if_empty: config.skip_if_empty,
                    max_buffered_lines: config.max_buffered_lines,
                    endpoint: format!("{}:{}", config.delivery.host, config.delivery.port),
                    security: config.delivery.security,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &TranscriptConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.delivery.host.is_empty() {
        warnings.push("delivery.host is empty - the decision callback must set it".to_string());
    }

    if config.max_buffered_lines.is_none() {
        warnings.push("max_buffered_lines is unset - buffer grows until delivered".to_string());
    }

    if !config.output_template.contains("{NewLine}") && config.line_separator.is_empty() {
        warnings.push("no {NewLine} and empty line_separator - lines will run together".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Name: {}", summary.name);
            println!("  Template: {}", summary.output_template);
            println!("  Subject: {}", summary.subject);
            println!("  Skip if empty: {}", summary.skip_if_empty);
            match summary.max_buffered_lines {
                Some(max) => println!("  Buffer bound: {} lines", max),
                None => println!("  Buffer bound: unbounded"),
            }
            println!("  Endpoint: {} ({:?})", summary.endpoint, summary.security);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
