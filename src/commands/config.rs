use colored::*;
use eyre::Result;
use serde::Serialize;

use crate::cli::{ConfigAction, OutputFormat, RunArgs};
use crate::config::{Config, RecordFormat, Settings};
use crate::interval;

/// Serializable view of the resolved settings
#[derive(Debug, Serialize)]
struct EffectiveSettings {
    log_level: &'static str,
    interval: String,
    /// `None` means unbounded
    total: Option<u64>,
    language: String,
    seed: Option<u64>,
    format: RecordFormat,
}

impl EffectiveSettings {
    fn new(config: &Config, settings: Settings) -> Self {
        Self {
            log_level: config.log_level.as_filter(),
            interval: interval::format(settings.interval),
            total: settings.total,
            language: settings.language,
            seed: settings.seed,
            format: settings.format,
        }
    }
}

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { run, output } => show(&run, OutputFormat::resolve(output), config),
    }
}

fn show(run: &RunArgs, format: OutputFormat, config: &Config) -> Result<()> {
    let effective = EffectiveSettings::new(config, Settings::from_env(config, &run.overrides()));

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&effective)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&effective)?);
        }
        OutputFormat::Text => {
            println!("{}", "synthlog settings".bold());
            println!();
            println!("  {}: {}", "log_level".cyan(), effective.log_level);
            println!("  {}: {}", "interval".cyan(), effective.interval);
            println!(
                "  {}: {}",
                "total".cyan(),
                effective.total.map_or_else(|| "unbounded".to_string(), |n| n.to_string())
            );
            println!("  {}: {}", "language".cyan(), effective.language);
            println!(
                "  {}: {}",
                "seed".cyan(),
                effective.seed.map_or_else(|| "random".to_string(), |n| n.to_string())
            );
            println!("  {}: {:?}", "format".cyan(), effective.format);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_effective_settings_json() {
        let settings = Settings {
            interval: Duration::from_millis(250),
            total: Some(12),
            seed: Some(3),
            ..Default::default()
        };
        let effective = EffectiveSettings::new(&Config::default(), settings);
        let value = serde_json::to_value(&effective).unwrap();
        assert_eq!(value["log_level"], "warn");
        assert_eq!(value["interval"], "250ms");
        assert_eq!(value["total"], 12);
        assert_eq!(value["language"], "rust");
        assert_eq!(value["seed"], 3);
        assert_eq!(value["format"], "json");
    }

    #[test]
    fn test_effective_settings_unbounded() {
        let effective = EffectiveSettings::new(&Config::default(), Settings::default());
        let value = serde_json::to_value(&effective).unwrap();
        assert_eq!(value["interval"], "1s");
        assert!(value["total"].is_null());
    }
}
