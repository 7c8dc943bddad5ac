use crate::adapters::pharma::PharmaApis;
use crate::adapters::remote::SourceCatalog;
use crate::adapters::storage::{Formulary, Icd10Catalog, LoadStatus, RegistryStore};
use crate::config::{AppConfig, ChainKind};
use crate::core::mapping::LocalMappingTable;
use crate::core::resolver::SourceChain;
use crate::core::safety::{InteractionTable, PregnancyTable};
use crate::domain::ports::DrugStore;
use crate::utils::error::Result;
use std::sync::Arc;

/// Datasets loaded once at startup. Read-only afterwards.
#[derive(Debug, Default)]
pub struct DataContext {
    pub registry: Arc<RegistryStore>,
    pub registry_status: LoadStatus,
    pub formulary: Formulary,
    pub formulary_status: LoadStatus,
    pub icd10: Icd10Catalog,
    pub icd10_status: LoadStatus,
}

impl DataContext {
    pub fn load(config: &AppConfig) -> Self {
        let (registry, registry_status) = RegistryStore::load(&config.drug_list_path());
        let (formulary, formulary_status) = Formulary::load(&config.formulary_path());
        let (icd10, icd10_status) = Icd10Catalog::load(&config.icd10_path());

        Self {
            registry: Arc::new(registry),
            registry_status,
            formulary,
            formulary_status,
            icd10,
            icd10_status,
        }
    }
}

/// Shared handler state. Cloned per request; everything inside is behind
/// an `Arc` or is a zero-sized table.
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<DataContext>,
    pub drug_store: Arc<dyn DrugStore>,
    pub icd10_live: Arc<SourceChain>,
    pub drug_icd10: Arc<SourceChain>,
    pub indications: Arc<LocalMappingTable>,
    pub interactions: InteractionTable,
    pub pregnancy: PregnancyTable,
    pub pharma: Arc<PharmaApis>,
}

impl AppState {
    /// Loads the datasets and wires every chain and client from config.
    pub fn bootstrap(config: &AppConfig) -> Result<Self> {
        let data = DataContext::load(config);
        Self::with_data(config, data)
    }

    pub fn with_data(config: &AppConfig, data: DataContext) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .build()?;

        let catalog = SourceCatalog::from_config(config, client.clone());
        let common = Arc::new(LocalMappingTable::common());

        let icd10_live = build_chain(config, &catalog, ChainKind::Icd10Live, common.clone())?;
        let drug_icd10 = build_chain(config, &catalog, ChainKind::DrugIcd10, common)?;

        tracing::info!(
            "Chains ready: icd10_live={:?} drug_icd10={:?}",
            icd10_live.strategy_names(),
            drug_icd10.strategy_names()
        );

        let drug_store: Arc<dyn DrugStore> = data.registry.clone();

        Ok(Self {
            data: Arc::new(data),
            drug_store,
            icd10_live: Arc::new(icd10_live),
            drug_icd10: Arc::new(drug_icd10),
            indications: Arc::new(LocalMappingTable::indications()),
            interactions: InteractionTable,
            pregnancy: PregnancyTable,
            pharma: Arc::new(PharmaApis::from_config(config, client)),
        })
    }

    pub fn registry(&self) -> &RegistryStore {
        &self.data.registry
    }
}

/// Assembles one configured chain around the shared local table.
pub fn build_chain(
    config: &AppConfig,
    catalog: &SourceCatalog,
    kind: ChainKind,
    local: Arc<LocalMappingTable>,
) -> Result<SourceChain> {
    let settings = config.chain(kind);
    let remotes = catalog.chain_sources(&settings)?;
    Ok(SourceChain::assemble(
        kind.key(),
        settings.order,
        local,
        remotes,
        settings.cap,
        settings.pacing,
    ))
}
