use life_agent_core::{Config, Database, InterventionEngine};
use serde::Serialize;

pub mod analyze;
pub mod check;
pub mod commit;
pub mod config;
pub mod intervention;
pub mod scan;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the default database and build an engine from the on-disk config.
pub fn open() -> Result<(Database, InterventionEngine, Config), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    tracing::debug!(?config, "loaded configuration");
    let db = Database::open()?;
    let engine = InterventionEngine::from_config(&config);
    Ok((db, engine, config))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
