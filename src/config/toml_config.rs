use crate::core::resolver::ChainOrder;
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_USER_AGENT: &str = "pharm-lookup/0.1";
pub const REMOTE_SOURCE_KEYS: &[&str] = &["nih", "icd10api", "who", "openfda", "rxnorm"];

const MAX_CHAIN_CAP: usize = 50;

/// Full service configuration. Every section is optional; accessors fill in
/// the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub http: HttpConfig,
    pub sources: BTreeMap<String, SourceOverride>,
    pub external: ExternalConfig,
    pub chains: ChainsConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory the default file names are resolved against.
    pub dir: Option<String>,
    pub drug_list: Option<String>,
    pub formulary: Option<String>,
    pub icd10: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceOverride {
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalConfig {
    pub openfda_base: Option<String>,
    pub rxnorm_base: Option<String>,
    pub chembl_base: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainsConfig {
    pub icd10_live: ChainConfig,
    pub drug_icd10: ChainConfig,
    pub batch: ChainConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub order: Option<ChainOrder>,
    pub sources: Option<Vec<String>>,
    pub cap: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub pacing_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: Option<usize>,
    pub batch_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Icd10Live,
    DrugIcd10,
    Batch,
}

impl ChainKind {
    pub fn key(&self) -> &'static str {
        match self {
            ChainKind::Icd10Live => "icd10_live",
            ChainKind::DrugIcd10 => "drug_icd10",
            ChainKind::Batch => "batch",
        }
    }

    fn default_order(&self) -> ChainOrder {
        match self {
            ChainKind::Icd10Live => ChainOrder::RemoteFirst,
            ChainKind::DrugIcd10 | ChainKind::Batch => ChainOrder::LocalFirst,
        }
    }

    fn default_sources(&self) -> &'static [&'static str] {
        match self {
            ChainKind::Icd10Live => &["nih", "icd10api", "who"],
            ChainKind::DrugIcd10 => &["nih"],
            ChainKind::Batch => &["nih", "openfda"],
        }
    }

    fn default_cap(&self) -> usize {
        match self {
            ChainKind::Icd10Live => 10,
            ChainKind::DrugIcd10 => 8,
            ChainKind::Batch => 3,
        }
    }

    fn default_pacing_ms(&self) -> Option<u64> {
        match self {
            ChainKind::Batch => Some(2000),
            _ => None,
        }
    }
}

/// A chain section with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSettings {
    pub order: ChainOrder,
    pub sources: Vec<String>,
    pub cap: usize,
    pub timeout: Duration,
    pub pacing: Option<Duration>,
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| LookupError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LookupError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(port) = self.server.port {
            validation::validate_positive_number("server.port", usize::from(port), 1)?;
        }
        if let Some(host) = &self.server.host {
            validation::validate_non_empty_string("server.host", host)?;
        }

        validation::validate_range("http.timeout_seconds", self.http_timeout().as_secs(), 1, 120)?;
        if let Some(agent) = &self.http.user_agent {
            validation::validate_non_empty_string("http.user_agent", agent)?;
        }

        for (key, source) in &self.sources {
            if !REMOTE_SOURCE_KEYS.contains(&key.as_str()) {
                return Err(unknown_source(&format!("sources.{}", key), key));
            }
            if let Some(endpoint) = &source.endpoint {
                validation::validate_endpoint_template(
                    &format!("sources.{}.endpoint", key),
                    endpoint,
                )?;
            }
        }

        validation::validate_url("external.openfda_base", &self.openfda_base())?;
        validation::validate_url("external.rxnorm_base", &self.rxnorm_base())?;
        validation::validate_url("external.chembl_base", &self.chembl_base())?;

        for kind in [ChainKind::Icd10Live, ChainKind::DrugIcd10, ChainKind::Batch] {
            let settings = self.chain(kind);
            let prefix = format!("chains.{}", kind.key());

            validation::validate_range(&format!("{}.cap", prefix), settings.cap, 1, MAX_CHAIN_CAP)?;
            validation::validate_range(
                &format!("{}.timeout_seconds", prefix),
                settings.timeout.as_secs(),
                1,
                120,
            )?;

            for source in &settings.sources {
                if !REMOTE_SOURCE_KEYS.contains(&source.as_str()) {
                    return Err(unknown_source(&format!("{}.sources", prefix), source));
                }
            }
            if settings.order == ChainOrder::RemoteOnly && settings.sources.is_empty() {
                return Err(LookupError::ConfigValidationError {
                    field: format!("{}.sources", prefix),
                    message: "a remote_only chain needs at least one source".to_string(),
                });
            }
        }

        validation::validate_positive_number("batch.batch_size", self.batch_size(), 1)?;

        for (field, path) in [
            ("data.drug_list", self.drug_list_path()),
            ("data.formulary", self.formulary_path()),
            ("data.icd10", self.icd10_path()),
        ] {
            validation::validate_path(field, &path.to_string_lossy())?;
        }

        Ok(())
    }

    pub fn host(&self) -> &str {
        self.server.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host(), self.port())
    }

    fn data_file(&self, explicit: &Option<String>, default_name: &str) -> PathBuf {
        match explicit {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(self.data.dir.as_deref().unwrap_or("data")).join(default_name),
        }
    }

    pub fn drug_list_path(&self) -> PathBuf {
        self.data_file(&self.data.drug_list, "UAE drug list.csv")
    }

    pub fn formulary_path(&self) -> PathBuf {
        self.data_file(&self.data.formulary, "daman-formulary.json")
    }

    pub fn icd10_path(&self) -> PathBuf {
        self.data_file(&self.data.icd10, "icd10-data.json")
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn user_agent(&self) -> &str {
        self.http.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn source_endpoint(&self, key: &str) -> Option<&str> {
        self.sources.get(key).and_then(|s| s.endpoint.as_deref())
    }

    pub fn openfda_base(&self) -> String {
        self.external
            .openfda_base
            .clone()
            .unwrap_or_else(|| "https://api.fda.gov".to_string())
    }

    pub fn rxnorm_base(&self) -> String {
        self.external
            .rxnorm_base
            .clone()
            .unwrap_or_else(|| "https://rxnav.nlm.nih.gov/REST".to_string())
    }

    pub fn chembl_base(&self) -> String {
        self.external
            .chembl_base
            .clone()
            .unwrap_or_else(|| "https://www.ebi.ac.uk/chembl/api/data".to_string())
    }

    pub fn external_timeout(&self) -> Duration {
        self.external
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(10))
    }

    pub fn chain(&self, kind: ChainKind) -> ChainSettings {
        let section = match kind {
            ChainKind::Icd10Live => &self.chains.icd10_live,
            ChainKind::DrugIcd10 => &self.chains.drug_icd10,
            ChainKind::Batch => &self.chains.batch,
        };

        ChainSettings {
            order: section.order.unwrap_or_else(|| kind.default_order()),
            sources: section.sources.clone().unwrap_or_else(|| {
                kind.default_sources().iter().map(|s| s.to_string()).collect()
            }),
            cap: section.cap.unwrap_or_else(|| kind.default_cap()),
            timeout: section
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or_else(|| self.http_timeout()),
            pacing: section
                .pacing_ms
                .or_else(|| kind.default_pacing_ms())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch.batch_size.unwrap_or(25)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch.batch_delay_ms.unwrap_or(10_000))
    }
}

fn unknown_source(field: &str, key: &str) -> LookupError {
    LookupError::InvalidConfigValueError {
        field: field.to_string(),
        value: key.to_string(),
        reason: format!("Unknown source. Valid sources: {}", REMOTE_SOURCE_KEYS.join(", ")),
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
