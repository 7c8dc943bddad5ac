use crate::domain::model::{DrugFilter, DrugRecord, FormularyEntry, Icd10Code};
use crate::domain::ports::DrugStore;
use crate::utils::error::{LookupError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

/// A missing or unreadable file gives an empty dataset and `loaded: false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStatus {
    pub loaded: bool,
    pub count: usize,
}

impl LoadStatus {
    pub fn ok(count: usize) -> Self {
        Self {
            loaded: true,
            count,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    pub fn label(&self) -> &'static str {
        if self.loaded {
            "ok"
        } else {
            "failed"
        }
    }
}

fn read_text(path: &Path, dataset: &str) -> Option<String> {
    if !path.exists() {
        tracing::warn!("{} file not found at {}, using empty dataset", dataset, path.display());
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => {
            tracing::error!("{} file {} is empty", dataset, path.display());
            None
        }
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!("Failed to read {} file {}: {}", dataset, path.display(), e);
            None
        }
    }
}

/// In-memory drug registry loaded from the registry CSV.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    drugs: Vec<DrugRecord>,
    by_id: HashMap<String, usize>,
}

impl RegistryStore {
    /// Keeps rows with a package name and numbers them from 1 in file order.
    pub fn new(drugs: Vec<DrugRecord>) -> Self {
        let drugs: Vec<DrugRecord> = drugs
            .into_iter()
            .filter(|d| !d.package_name.trim().is_empty())
            .enumerate()
            .map(|(index, mut drug)| {
                drug.id = index + 1;
                drug
            })
            .collect();

        let by_id = drugs
            .iter()
            .enumerate()
            .map(|(index, drug)| (drug.id.to_string(), index))
            .collect();

        Self { drugs, by_id }
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut drugs = Vec::new();
        for row in csv_reader.deserialize::<DrugRecord>() {
            match row {
                Ok(drug) => drugs.push(drug),
                Err(e) => tracing::debug!("Skipping malformed registry row: {}", e),
            }
        }

        Ok(Self::new(drugs))
    }

    pub fn from_csv_str(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self::from_csv_reader(text.as_bytes())
    }

    pub fn load(path: &Path) -> (Self, LoadStatus) {
        let Some(text) = read_text(path, "UAE drug registry") else {
            return (Self::default(), LoadStatus::failed());
        };

        match Self::from_csv_str(&text) {
            Ok(store) if store.is_empty() => {
                tracing::error!("No valid drugs found in {}", path.display());
                (store, LoadStatus::failed())
            }
            Ok(store) => {
                tracing::info!("✅ Loaded {} drugs from UAE registry", store.len());
                let status = LoadStatus::ok(store.len());
                (store, status)
            }
            Err(e) => {
                tracing::error!("Failed to parse UAE registry: {}", e);
                (Self::default(), LoadStatus::failed())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn drugs(&self) -> &[DrugRecord] {
        &self.drugs
    }

    pub fn by_id(&self, id: &str) -> Option<&DrugRecord> {
        self.by_id.get(id.trim()).map(|index| &self.drugs[*index])
    }

    /// First drug whose package or generic name contains the name.
    pub fn find_by_name(&self, name: &str) -> Option<&DrugRecord> {
        let needle = name.trim().to_lowercase();
        self.drugs.iter().find(|d| d.name_contains(&needle))
    }

    /// Match on package, generic or manufacturer name.
    pub fn search_any(&self, term: &str, limit: usize) -> Vec<&DrugRecord> {
        let needle = term.trim().to_lowercase();
        self.drugs
            .iter()
            .filter(|d| d.name_contains(&needle) || d.manufacturer.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    /// Drugs whose package or generic name contains any keyword.
    pub fn with_keywords(&self, keywords: &[&str], limit: usize) -> Vec<&DrugRecord> {
        if keywords.is_empty() {
            return Vec::new();
        }
        self.drugs
            .iter()
            .filter(|d| keywords.iter().any(|k| d.name_contains(k)))
            .take(limit)
            .collect()
    }

    /// Sorted distinct dosage forms of active drugs.
    pub fn categories(&self) -> Vec<String> {
        self.drugs
            .iter()
            .filter(|d| d.is_active() && !d.dosage_form.is_empty())
            .map(|d| d.dosage_form.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[async_trait]
impl DrugStore for RegistryStore {
    async fn find(&self, filter: &DrugFilter, limit: usize) -> Result<Vec<DrugRecord>> {
        Ok(self
            .drugs
            .iter()
            .filter(|d| filter.matches(d))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<DrugRecord>> {
        Ok(self.by_id(id).cloned())
    }

    async fn count(&self) -> usize {
        self.len()
    }
}

/// Daman insurance formulary.
#[derive(Debug, Clone, Default)]
pub struct Formulary {
    medications: Vec<FormularyEntry>,
}

impl Formulary {
    pub fn new(medications: Vec<FormularyEntry>) -> Self {
        Self { medications }
    }

    /// Accepts an array, `{medications: [...]}`, `{data: [...]}` or an
    /// object whose values are medications.
    pub fn from_value(value: Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match (map.remove("medications"), map.remove("data")) {
                (Some(Value::Array(items)), _) => items,
                (_, Some(Value::Array(items))) => items,
                (medications, data) => {
                    // neither wrapper key held an array; treat every value as a medication
                    if let Some(v) = medications {
                        map.insert("medications".to_string(), v);
                    }
                    if let Some(v) = data {
                        map.insert("data".to_string(), v);
                    }
                    map.into_iter().map(|(_, v)| v).collect()
                }
            },
            _ => {
                return Err(LookupError::ConfigError {
                    message: "formulary must be a JSON array or object".to_string(),
                })
            }
        };

        let medications = items
            .into_iter()
            .filter_map(|item| serde_json::from_value::<FormularyEntry>(item).ok())
            .collect();

        Ok(Self::new(medications))
    }

    pub fn load(path: &Path) -> (Self, LoadStatus) {
        let Some(text) = read_text(path, "Daman formulary") else {
            return (Self::default(), LoadStatus::failed());
        };

        let parsed = serde_json::from_str::<Value>(&text)
            .map_err(LookupError::from)
            .and_then(Self::from_value);

        match parsed {
            Ok(formulary) => {
                tracing::info!("✅ Loaded {} medications from Daman formulary", formulary.len());
                let status = LoadStatus::ok(formulary.len());
                (formulary, status)
            }
            Err(e) => {
                tracing::error!("Failed to load Daman formulary: {}", e);
                (Self::default(), LoadStatus::failed())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.medications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.medications.is_empty()
    }

    pub fn medications(&self) -> &[FormularyEntry] {
        &self.medications
    }

    /// Exact, case-insensitive match on name or active ingredient.
    pub fn find_exact(&self, drug: &str) -> Option<&FormularyEntry> {
        let needle = drug.trim().to_lowercase();
        self.medications.iter().find(|m| {
            m.name.to_lowercase() == needle || m.active_ingredient.to_lowercase() == needle
        })
    }

    /// Medications whose name or active ingredient contains the term.
    pub fn search(&self, drug: &str) -> Vec<&FormularyEntry> {
        let needle = drug.trim().to_lowercase();
        self.medications
            .iter()
            .filter(|m| {
                m.name.to_lowercase().contains(&needle)
                    || m.active_ingredient.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

/// Local ICD-10 catalog for text search.
#[derive(Debug, Clone, Default)]
pub struct Icd10Catalog {
    codes: Vec<Icd10Code>,
}

impl Icd10Catalog {
    pub fn new(codes: Vec<Icd10Code>) -> Self {
        Self { codes }
    }

    /// Accepts an object whose values are arrays of codes (flattened in
    /// key order) or a plain array.
    pub fn from_value(value: Value) -> Self {
        let items: Vec<Value> = match value {
            Value::Array(items) => items,
            Value::Object(map) => map
                .into_iter()
                .flat_map(|(_, group)| match group {
                    Value::Array(items) => items,
                    other => vec![other],
                })
                .collect(),
            _ => Vec::new(),
        };

        Self::new(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<Icd10Code>(item).ok())
                .collect(),
        )
    }

    pub fn load(path: &Path) -> (Self, LoadStatus) {
        let Some(text) = read_text(path, "ICD-10 catalog") else {
            return (Self::default(), LoadStatus::failed());
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                let catalog = Self::from_value(value);
                tracing::info!("✅ Loaded {} ICD-10 codes", catalog.len());
                let status = LoadStatus::ok(catalog.len());
                (catalog, status)
            }
            Err(e) => {
                tracing::error!("Failed to parse ICD-10 catalog: {}", e);
                (Self::default(), LoadStatus::failed())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Case-insensitive containment on code or description.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Icd10Code> {
        let needle = query.trim().to_lowercase();
        self.codes
            .iter()
            .filter(|c| {
                c.code.to_lowercase().contains(&needle)
                    || c.description.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const REGISTRY_CSV: &str = "\u{feff}Package Name,Generic Name,Strength,Dosage Form,Package Size,Status,Manufacturer Name,Agent Name,Package Price to Public,Package Price to Pharmacy,Unit Price to Public,Included in Thiqa/ ABM - other than 1&7- Drug Formulary,Included In Basic Drug Formulary,Included In ABM 1 Drug Formulary,Included In ABM 7 Drug Formulary
GLUCOPHAGE 500MG, Metformin Hydrochloride ,500mg,Film-coated tablet,50,Active,Merck Serono,Agent A,12.50,10.00,0.25,Yes,No,Yes,No
,Orphan row,1mg,Tablet,10,Active,Nobody,Agent B,1,1,1,No,No,No,No
NORVASC 5MG,Amlodipine,5mg,Tablet,30,Active,Pfizer,Agent C,40.00,32.00,1.33,Yes,Yes,No,No
OLDPHAGE,Metformin,850mg,Tablet,30,Inactive,Generic Co,Agent D,5,4,0.2,No,No,No,No
";

    #[test]
    fn test_registry_parses_and_numbers_rows() {
        let store = RegistryStore::from_csv_str(REGISTRY_CSV).unwrap();

        assert_eq!(store.len(), 3);
        let glucophage = store.by_id("1").unwrap();
        assert_eq!(glucophage.package_name, "GLUCOPHAGE 500MG");
        assert_eq!(glucophage.generic_name, "Metformin Hydrochloride");
        assert!(glucophage.thiqa_coverage());
        assert!(!glucophage.basic_coverage());
        assert!(glucophage.abm1_coverage());

        // the nameless row is dropped before numbering
        assert_eq!(store.by_id("2").unwrap().package_name, "NORVASC 5MG");
        assert!(store.by_id("99").is_none());
    }

    #[tokio::test]
    async fn test_drug_store_find_active_only() {
        let store = RegistryStore::from_csv_str(REGISTRY_CSV).unwrap();
        let filter = DrugFilter {
            query: Some("metformin".to_string()),
            category: None,
            active_only: true,
        };

        let found = store.find(&filter, 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);

        assert_eq!(store.count().await, 3);
        assert!(store.get("3").await.unwrap().is_some());
    }

    #[test]
    fn test_registry_helpers() {
        let store = RegistryStore::from_csv_str(REGISTRY_CSV).unwrap();

        assert_eq!(store.categories(), vec!["Film-coated tablet", "Tablet"]);
        assert_eq!(store.search_any("pfizer", 10)[0].package_name, "NORVASC 5MG");
        assert_eq!(store.search_any("metformin", 1).len(), 1);
        assert_eq!(store.find_by_name("amlodipine").unwrap().id, 2);
        assert_eq!(store.with_keywords(&["amlodipine", "metformin"], 20).len(), 3);
        assert!(store.with_keywords(&[], 20).is_empty());
    }

    #[test]
    fn test_registry_missing_file_is_empty() {
        let (store, status) = RegistryStore::load(Path::new("/nonexistent/registry.csv"));
        assert!(store.is_empty());
        assert_eq!(status, LoadStatus::failed());
        assert_eq!(status.label(), "failed");
    }

    #[test]
    fn test_registry_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(REGISTRY_CSV.as_bytes()).unwrap();

        let (store, status) = RegistryStore::load(file.path());
        assert_eq!(status, LoadStatus::ok(3));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_formulary_shapes() {
        let entry = json!({"name": "Glucophage", "activeIngredient": "Metformin", "tier": 1});

        for value in [
            json!([entry.clone()]),
            json!({"medications": [entry.clone()]}),
            json!({"data": [entry.clone()]}),
            json!({"glucophage": entry.clone()}),
        ] {
            let formulary = Formulary::from_value(value).unwrap();
            assert_eq!(formulary.len(), 1);
            assert_eq!(formulary.medications()[0].name, "Glucophage");
        }

        assert!(Formulary::from_value(json!("nope")).is_err());
    }

    #[test]
    fn test_formulary_matching() {
        let formulary = Formulary::from_value(json!([
            {"name": "Glucophage", "activeIngredient": "Metformin"},
            {"name": "Lipitor", "activeIngredient": "Atorvastatin"}
        ]))
        .unwrap();

        assert_eq!(formulary.find_exact("METFORMIN").unwrap().name, "Glucophage");
        assert!(formulary.find_exact("metfor").is_none());
        assert_eq!(formulary.search("statin").len(), 1);
    }

    #[test]
    fn test_icd10_catalog_flattens_groups() {
        let catalog = Icd10Catalog::from_value(json!({
            "diabetes": [
                {"code": "E11.9", "description": "Type 2 diabetes mellitus without complications"},
                {"code": "E10.9", "description": "Type 1 diabetes mellitus without complications"}
            ],
            "cardio": [
                {"code": "I10", "description": "Essential (primary) hypertension"},
                {"bogus": true}
            ]
        }));

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.search("diabetes", 20).len(), 2);
        assert_eq!(catalog.search("i10", 20)[0].code, "I10");
        assert_eq!(catalog.search("diabetes", 1).len(), 1);
    }

    #[test]
    fn test_icd10_catalog_bad_json_is_failed() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let (catalog, status) = Icd10Catalog::load(file.path());
        assert!(catalog.is_empty());
        assert!(!status.loaded);
    }
}
