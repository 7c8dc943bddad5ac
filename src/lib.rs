pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::{build_router, AppState};
pub use config::AppConfig;
pub use crate::core::{ChainOrder, SourceChain};
pub use domain::model::{CodeEntry, ResolutionResult};
pub use utils::error::{LookupError, Result};
