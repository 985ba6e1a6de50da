use crate::config::toml_config::DeckConfig;
use crate::domain::model::RunMode;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "shop-deck.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "shop-deck")]
#[command(about = "Builds a per-business photo report deck from a PowerPoint template")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Template presentation (.pptx)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Root of the region/sub-region/business image tree
    #[arg(long)]
    pub images: Option<PathBuf>,

    /// Spreadsheet listing business names in display order
    #[arg(long)]
    pub order: Option<PathBuf>,

    /// Output presentation path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit only the first N businesses
    #[arg(long, value_name = "N", conflicts_with = "interactive")]
    pub sample: Option<usize>,

    /// Ask for sample or full run before emitting
    #[arg(short, long)]
    pub interactive: bool,

    /// Scan and resolve order only, write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl CliConfig {
    /// Config file (explicit or default) with command-line overrides applied.
    pub fn load_config(&self) -> Result<DeckConfig> {
        let mut config = match self.config_path() {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                DeckConfig::from_file(path)?
            }
            None => DeckConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn config_path(&self) -> Option<&Path> {
        match &self.config {
            Some(path) => Some(path.as_path()),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                default.is_file().then_some(default)
            }
        }
    }

    pub fn apply_overrides(&self, config: &mut DeckConfig) {
        if let Some(template) = &self.template {
            config.paths.template = template.clone();
        }
        if let Some(images) = &self.images {
            config.paths.image_root = images.clone();
        }
        if let Some(order) = &self.order {
            config.paths.order_file = Some(order.clone());
        }
        if let Some(output) = &self.output {
            config.paths.output = output.clone();
        }
        if let Some(sample) = self.sample {
            config.run.sample_size = sample;
        }
    }

    /// Mode fixed by flags; `None` means it is chosen interactively.
    pub fn run_mode(&self) -> Option<RunMode> {
        if self.interactive {
            return None;
        }
        Some(match self.sample {
            Some(n) => RunMode::Sample(n),
            None => RunMode::Full,
        })
    }
}
