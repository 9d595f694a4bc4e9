//! Stream verification command
//!
//! Reads a captured JSONL stream and reports gaps and malformed records.

use colored::*;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::verify::{self, Report};

/// Cap on violations listed in text output
const MAX_LISTED: usize = 20;

/// Run the verify command
pub fn run(input: Option<&Path>, format: OutputFormat) -> Result<()> {
    let report = match input {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path).context(format!("Failed to open {}", path.display()))?;
            verify::verify(BufReader::new(file))?
        }
        _ => verify::verify(io::stdin().lock())?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
        OutputFormat::Text => print_report(&report, input.map(Path::to_path_buf)),
    }

    if !report.is_clean() {
        eyre::bail!("{} violation(s) in {} record(s)", report.violations.len(), report.records);
    }
    Ok(())
}

fn print_report(report: &Report, input: Option<PathBuf>) {
    let source = input.map_or_else(|| "stdin".to_string(), |p| p.display().to_string());
    println!("{} {}", "Verified".bold(), source.cyan());
    println!();
    println!("  records: {}", report.records);
    for (level, count) in &report.levels {
        println!("    {:<8} {}", level.as_str(), count);
    }
    println!("  request_id present: {:.1}%", report.request_id_rate() * 100.0);
    println!("  duration_ms present: {:.1}%", report.duration_rate() * 100.0);
    println!();

    if report.is_clean() {
        println!("{} No violations", "✓".green());
        return;
    }

    println!("{} {} violation(s):", "✗".red(), report.violations.len());
    for violation in report.violations.iter().take(MAX_LISTED) {
        println!("  line {}: {}", violation.line, violation.kind);
    }
    if report.violations.len() > MAX_LISTED {
        println!("  ... and {} more", report.violations.len() - MAX_LISTED);
    }
}
