use crate::config::{AppConfig, ChainSettings};
use crate::core::normalizer::ProviderParser;
use crate::domain::model::CodeEntry;
use crate::domain::ports::LookupStrategy;
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Static description of a known remote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub endpoint: &'static str,
    pub parser: ProviderParser,
}

pub const KNOWN_SOURCES: &[SourceDescriptor] = &[
    SourceDescriptor {
        key: "nih",
        name: "NIH Clinical Tables",
        endpoint: "https://clinicaltables.nlm.nih.gov/api/icd10cm/v3/search?sf=code,name&terms={term}",
        parser: ProviderParser::NihClinicalTables,
    },
    SourceDescriptor {
        key: "icd10api",
        name: "ICD-10 API",
        endpoint: "https://icd10api.com/?s={term}&desc=short&r=json",
        parser: ProviderParser::Icd10Api,
    },
    SourceDescriptor {
        key: "who",
        name: "WHO ICD",
        endpoint: "https://id.who.int/icd/release/11/2019-04/mms/search?q={term}",
        parser: ProviderParser::WhoIcd,
    },
    SourceDescriptor {
        key: "openfda",
        name: "OpenFDA Drug API",
        endpoint: "https://api.fda.gov/drug/label.json?search=openfda.generic_name:\"{term}\"&limit=3",
        parser: ProviderParser::OpenFdaIndications,
    },
    SourceDescriptor {
        key: "rxnorm",
        name: "RxNorm",
        endpoint: "https://rxnav.nlm.nih.gov/REST/drugs.json?name={term}",
        parser: ProviderParser::RxNormConcepts,
    },
];

pub fn descriptor(key: &str) -> Option<&'static SourceDescriptor> {
    KNOWN_SOURCES.iter().find(|d| d.key == key)
}

/// One remote source. Every failure collapses to an empty answer so the
/// chain moves on to the next strategy.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    name: String,
    endpoint_template: String,
    parser: ProviderParser,
    client: Client,
    timeout: Duration,
    user_agent: String,
}

impl RemoteSource {
    pub fn new(
        name: impl Into<String>,
        endpoint_template: impl Into<String>,
        parser: ProviderParser,
        client: Client,
        timeout: Duration,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint_template: endpoint_template.into(),
            parser,
            client,
            timeout,
            user_agent: user_agent.into(),
        }
    }

    pub fn build_url(&self, term: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(term.as_bytes()).collect();
        self.endpoint_template.replace("{term}", &encoded)
    }

    /// Single GET against the source. Errors are returned, not logged.
    pub async fn fetch(&self, term: &str) -> Result<Vec<CodeEntry>> {
        let url = self.build_url(term);
        tracing::debug!("🌐 {}: GET {}", self.name, url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::UpstreamStatus {
                source_name: self.name.clone(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(self.parser.parse(&body)?)
    }
}

#[async_trait]
impl LookupStrategy for RemoteSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, term: &str) -> Vec<CodeEntry> {
        match self.fetch(term).await {
            Ok(entries) => {
                tracing::debug!("{} returned {} entries for '{}'", self.name, entries.len(), term);
                entries
            }
            Err(LookupError::UpstreamStatus { status, .. }) => {
                tracing::debug!("{} answered HTTP {} for '{}'", self.name, status, term);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("⚠️ {} failed for '{}': {}", self.name, term, e);
                Vec::new()
            }
        }
    }
}

/// Builds remote sources from the known descriptors plus config overrides.
#[derive(Debug, Clone)]
pub struct SourceCatalog {
    client: Client,
    user_agent: String,
    overrides: BTreeMap<String, String>,
}

impl SourceCatalog {
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let overrides = KNOWN_SOURCES
            .iter()
            .filter_map(|d| Some((d.key.to_string(), config.source_endpoint(d.key)?.to_string())))
            .collect();

        Self {
            client,
            user_agent: config.user_agent().to_string(),
            overrides,
        }
    }

    pub fn with_endpoint(mut self, key: &str, endpoint: impl Into<String>) -> Self {
        self.overrides.insert(key.to_string(), endpoint.into());
        self
    }

    pub fn source(&self, key: &str, timeout: Duration) -> Result<RemoteSource> {
        let descriptor = descriptor(key).ok_or_else(|| LookupError::ConfigError {
            message: format!("unknown remote source '{}'", key),
        })?;

        let endpoint = self
            .overrides
            .get(key)
            .map(String::as_str)
            .unwrap_or(descriptor.endpoint);

        Ok(RemoteSource::new(
            descriptor.name,
            endpoint,
            descriptor.parser,
            self.client.clone(),
            timeout,
            self.user_agent.clone(),
        ))
    }

    /// The remote strategies of a chain, in configured priority order.
    pub fn chain_sources(&self, settings: &ChainSettings) -> Result<Vec<Arc<dyn LookupStrategy>>> {
        settings
            .sources
            .iter()
            .map(|key| {
                let source = self.source(key, settings.timeout)?;
                Ok(Arc::new(source) as Arc<dyn LookupStrategy>)
            })
            .collect()
    }
}
