//! Record emission command

use eyre::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, IsTerminal};

use crate::cli::RunArgs;
use crate::config::{Config, RecordFormat, Settings};
use crate::emitter::Emitter;

/// Run the generator until the configured total is reached
pub fn run(args: &RunArgs, config: &Config) -> Result<()> {
    let settings = Settings::from_env(config, &args.overrides());
    log::info!("Resolved settings: {:?}", settings);

    if settings.format == RecordFormat::Text && !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let stdout = io::stdout();
    let mut emitter = Emitter::new(settings, stdout.lock(), rng);
    let emitted = emitter.run()?;

    log::info!("Done after {} records", emitted);
    Ok(())
}
