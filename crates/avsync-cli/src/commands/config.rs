//! Config command - view and bootstrap avsync configuration
//!
//! Provides the `avsync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Prints the configuration file path
//! 3. Writes a default configuration file to get started

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use crate::output::{get_formatter, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(config_path, format).await,
            ConfigCommand::Path => self.execute_path(config_path, format),
            ConfigCommand::Init { force } => self.execute_init(*force, config_path, format).await,
        }
    }

    /// Shows the effective configuration
    async fn execute_show(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        use avsync_core::config::Config;

        let formatter = get_formatter(format);

        let path = resolve_config_path(config_path);
        let config = Config::load_or_default(&path);

        info!(config_path = %path.display(), "Showing configuration");

        if format == OutputFormat::Json {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!("Configuration ({})", path.display()));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }

        let problems = config.validate();
        if !problems.is_empty() {
            formatter.warn(&format!(
                "{} validation problem{}",
                problems.len(),
                if problems.len() == 1 { "" } else { "s" }
            ));
            for problem in &problems {
                formatter.info(&problem.to_string());
            }
        }
        Ok(())
    }

    /// Prints the effective configuration file path
    fn execute_path(&self, config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let path = resolve_config_path(config_path);

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::json!({
                "path": path.display().to_string(),
                "exists": path.exists(),
            }));
            return Ok(());
        }

        // Bare path on stdout so shells can capture it
        println!("{}", path.display());
        Ok(())
    }

    /// Writes a default configuration file
    async fn execute_init(
        &self,
        force: bool,
        config_path: Option<&Path>,
        format: OutputFormat,
    ) -> Result<()> {
        let formatter = get_formatter(format);
        let path = resolve_config_path(config_path);

        if path.exists() && !force {
            if format == OutputFormat::Json {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "config_path": path.display().to_string(),
                    "error": "configuration file already exists",
                }));
            } else {
                formatter.error(&format!(
                    "{} already exists (pass --force to overwrite)",
                    path.display()
                ));
            }
            return Ok(());
        }

        write_default_config(&path)?;
        info!(config_path = %path.display(), "Wrote default configuration");

        if format == OutputFormat::Json {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "config_path": path.display().to_string(),
            }));
            return Ok(());
        }

        formatter.success(&format!(
            "Wrote default configuration to {}",
            path.display()
        ));
        formatter.info("Adjust store.database_path and photos.storage_dir before the first crawl");
        Ok(())
    }
}

/// Resolves the effective configuration file path
///
/// The global `--config` flag wins; otherwise the platform default under
/// the user's config directory is used.
pub(crate) fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(avsync_core::config::Config::default_path)
}

/// Serializes the default configuration and writes it to `path`, creating
/// parent directories as needed
fn write_default_config(path: &Path) -> Result<()> {
    use avsync_core::config::Config;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(&Config::default())
        .context("Failed to serialize configuration")?;
    std::fs::write(path, &yaml).context("Failed to write configuration file")?;
    Ok(())
}
