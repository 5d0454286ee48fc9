//! Configuration check command.

use anyhow::Result;
use quant_config::load_config;
use std::path::Path;

use super::registry_for;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Checking {}", config_path.display());

    let config = load_config(config_path).map_err(|e| {
        println!("  ✗ load: {e}");
        e
    })?;
    println!("  ✓ load and value checks");

    let registry = registry_for(&config).map_err(|e| {
        println!("  ✗ strategies: {e:#}");
        e
    })?;
    println!("  ✓ strategies: {}", registry.names().join(", "));

    println!();
    println!("{} ({})", config.app.name, config.app.environment);
    println!(
        "  server   {} [{}]",
        config.server.listen_addr, config.server.protocol
    );
    println!(
        "  session  {} signals / {} debug series per message",
        config.session.signal_chunk_size, config.session.debug_chunk_size
    );
    println!(
        "  logging  {} ({:?})",
        config.logging.level, config.logging.format
    );

    Ok(())
}
