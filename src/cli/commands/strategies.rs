//! List strategies command.

use anyhow::Result;
use std::path::Path;

use super::{load_settings, registry_for};

pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_settings(config_path)?;
    let registry = registry_for(&config)?;

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for name in registry.names() {
        println!("  {name}");
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", registry.description(name).unwrap_or_default());
        println!("  default config: {}", registry.default_config(name).unwrap_or("{}"));
        println!();
    }

    println!("Use --strategy <name> with replay, or the name in a create message.");

    Ok(())
}
