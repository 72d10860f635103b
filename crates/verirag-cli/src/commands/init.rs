//! Init 命令

use anyhow::{Context, Result};
use std::path::Path;

use verirag_core::Config;

pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }

    let config = Config::default();
    config
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Configuration initialized at: {}", path.display());
    println!("\nDefault configuration:");
    println!("  Chat model: {} ({})", config.ai.chat_model, config.ai.base_url);
    println!("  Corpus directory: {}", config.corpus.data_dir.display());
    println!(
        "\nSet {} and {} in the environment or a .env file.",
        config.ai.api_key_env, config.search.api_key_env
    );

    Ok(())
}
