pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, LogFormat};

pub use adapters::{CollectingSink, ConsoleProgress, FileImageProbe, PptxDocument};
pub use config::DeckConfig;
pub use self::core::{build_deck, DeckEngine};
pub use domain::model::{BusinessRecord, RunMode, RunSummary};
pub use utils::error::{DeckError, Result};
