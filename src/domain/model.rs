use serde::{Deserialize, Serialize};

pub const SOURCE_LOCAL_MAPPING: &str = "Local Mapping";
pub const SOURCE_LOCAL_FALLBACK: &str = "Local Fallback";
pub const SOURCE_NONE: &str = "None";

/// Normalized diagnosis code result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub description: String,
}

impl CodeEntry {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }

    /// Entries with a blank code or description never leave the normalizer.
    pub fn is_complete(&self) -> bool {
        !self.code.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// Outcome of one chain resolution. `source` names the layer that answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult {
    pub entries: Vec<CodeEntry>,
    pub source: String,
}

impl ResolutionResult {
    pub fn none() -> Self {
        Self {
            entries: Vec::new(),
            source: SOURCE_NONE.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One row of the UAE drug registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrugRecord {
    #[serde(skip_deserializing)]
    pub id: usize,
    #[serde(rename = "Package Name")]
    pub package_name: String,
    #[serde(rename = "Generic Name")]
    pub generic_name: String,
    #[serde(rename = "Strength")]
    pub strength: String,
    #[serde(rename = "Dosage Form")]
    pub dosage_form: String,
    #[serde(rename = "Package Size")]
    pub package_size: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Manufacturer Name")]
    pub manufacturer: String,
    #[serde(rename = "Agent Name")]
    pub agent: String,
    #[serde(rename = "Package Price to Public")]
    pub price_public: String,
    #[serde(rename = "Package Price to Pharmacy")]
    pub price_pharmacy: String,
    #[serde(rename = "Unit Price to Public")]
    pub unit_price_public: String,
    #[serde(rename = "Included in Thiqa/ ABM - other than 1&7- Drug Formulary")]
    pub thiqa_formulary: String,
    #[serde(rename = "Included In Basic Drug Formulary")]
    pub basic_formulary: String,
    #[serde(rename = "Included In ABM 1 Drug Formulary")]
    pub abm1_formulary: String,
    #[serde(rename = "Included In ABM 7 Drug Formulary")]
    pub abm7_formulary: String,
}

impl DrugRecord {
    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }

    pub fn thiqa_coverage(&self) -> bool {
        self.thiqa_formulary == "Yes"
    }

    pub fn basic_coverage(&self) -> bool {
        self.basic_formulary == "Yes"
    }

    pub fn abm1_coverage(&self) -> bool {
        self.abm1_formulary == "Yes"
    }

    pub fn abm7_coverage(&self) -> bool {
        self.abm7_formulary == "Yes"
    }

    /// Case-insensitive containment on package or generic name.
    pub fn name_contains(&self, needle_lower: &str) -> bool {
        self.package_name.to_lowercase().contains(needle_lower)
            || self.generic_name.to_lowercase().contains(needle_lower)
    }
}

/// Filter passed to the drug store.
#[derive(Debug, Clone, Default)]
pub struct DrugFilter {
    pub query: Option<String>,
    pub category: Option<String>,
    pub active_only: bool,
}

impl DrugFilter {
    pub fn matches(&self, drug: &DrugRecord) -> bool {
        if self.active_only && !drug.is_active() {
            return false;
        }

        let matches_query = match self.query.as_deref().filter(|q| !q.is_empty()) {
            Some(query) => drug.name_contains(&query.to_lowercase()),
            None => true,
        };

        let matches_category = match self.category.as_deref().filter(|c| !c.is_empty()) {
            Some(category) => drug
                .dosage_form
                .to_lowercase()
                .contains(&category.to_lowercase()),
            None => true,
        };

        matches_query && matches_category
    }
}

/// Daman formulary medication. Fields beyond the two used for matching are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormularyEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "activeIngredient", alias = "genericName")]
    pub active_ingredient: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icd10Code {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interaction {
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PregnancyProfile {
    pub drug: String,
    pub category: String,
    pub description: String,
    pub recommendation: String,
    #[serde(rename = "categoryDescription", skip_serializing_if = "Option::is_none")]
    pub category_description: Option<String>,
}
