use std::path::PathBuf;

use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "effectforge-backend")]
#[command(about = "EffectForge HTTP server: turns effect descriptions into canvas code")]
#[command(version)]
pub struct CliArgs {
    /// Path to a TOML, YAML or JSON configuration file.
    #[arg(short = 'c', long = "config-path", env = "EFFECTFORGE_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,
}
