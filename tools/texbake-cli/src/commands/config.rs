//! Show the effective configuration.

use texbake_common::config::{config_file_path, ServiceConfig};

pub fn run(config: &ServiceConfig, save: bool) -> anyhow::Result<bool> {
    // `password` is never serialized.
    println!("{}", serde_json::to_string_pretty(config)?);

    if save {
        config.save()?;
        eprintln!("Saved to {}", config_file_path().display());
    }
    Ok(true)
}
