pub mod toml_config;

pub use toml_config::{AppConfig, ChainKind, ChainSettings};

#[cfg(feature = "cli")]
use clap::Parser;

/// Server command line. Values given here override the config file.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "pharm-lookup")]
#[command(about = "Drug registry, formulary and ICD-10 lookup service")]
pub struct CliConfig {
    #[arg(long, short = 'c', help = "Path to a TOML config file")]
    pub config: Option<String>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    #[arg(long, help = "Directory holding the drug list, formulary and ICD-10 files")]
    pub data_dir: Option<String>,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn load_app_config(&self) -> crate::utils::error::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            config.server.port = Some(port);
        }
        if let Some(dir) = &self.data_dir {
            config.data.dir = Some(dir.clone());
        }
    }
}
