use crate::domain::model::{CodeEntry, SOURCE_LOCAL_FALLBACK, SOURCE_LOCAL_MAPPING};
use crate::domain::ports::LookupStrategy;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

const T2DM: (&str, &str) = ("E11.9", "Type 2 diabetes mellitus without complications");
const T1DM: (&str, &str) = ("E10.9", "Type 1 diabetes mellitus without complications");
const HYPERTENSION: (&str, &str) = ("I10", "Essential (primary) hypertension");
const HYPERLIPIDEMIA: (&str, &str) = ("E78.5", "Hyperlipidemia, unspecified");
const CAD: (&str, &str) = (
    "I25.10",
    "Atherosclerotic heart disease of native coronary artery",
);
const AFIB: (&str, &str) = ("I48.91", "Unspecified atrial fibrillation");
const ASTHMA: (&str, &str) = ("J45.909", "Unspecified asthma, uncomplicated");
const GERD: (&str, &str) = (
    "K21.9",
    "Gastro-esophageal reflux disease without esophagitis",
);
const HYPOTHYROIDISM: (&str, &str) = ("E03.9", "Hypothyroidism, unspecified");
const DEPRESSION: (&str, &str) = (
    "F32.9",
    "Major depressive disorder, single episode, unspecified",
);
const CHRONIC_PAIN: (&str, &str) = ("G89.29", "Other chronic pain");
const URI: (&str, &str) = ("J06.9", "Acute upper respiratory infection, unspecified");
const UTI: (&str, &str) = ("N39.0", "Urinary tract infection, site not specified");

/// ICD-10 three-character prefix to drug name keywords.
const PREFIX_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "E11",
        &[
            "metformin",
            "insulin",
            "glimepiride",
            "gliclazide",
            "sitagliptin",
            "empagliflozin",
            "liraglutide",
            "semaglutide",
            "dulaglutide",
        ],
    ),
    (
        "I10",
        &["amlodipine", "lisinopril", "losartan", "bisoprolol", "carvedilol"],
    ),
    ("K21", &["omeprazole", "pantoprazole", "esomeprazole"]),
    ("J45", &["albuterol", "salbutamol", "montelukast", "fluticasone"]),
    ("E78", &["atorvastatin", "simvastatin", "rosuvastatin"]),
];

/// Keys keep insertion order; a partial match resolves to the first key.
#[derive(Debug, Clone, Default)]
pub struct LocalMappingTable {
    entries: Vec<(String, Vec<CodeEntry>)>,
}

impl LocalMappingTable {
    pub fn from_pairs(pairs: &[(&str, &[(&str, &str)])]) -> Self {
        let entries = pairs
            .iter()
            .map(|(key, codes)| {
                (
                    key.to_lowercase(),
                    codes
                        .iter()
                        .map(|(code, description)| CodeEntry::new(*code, *description))
                        .collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Common medications table used by drug-to-code resolution.
    pub fn common() -> Self {
        Self::from_pairs(&[
            ("metformin", &[T2DM]),
            ("insulin", &[T1DM, T2DM]),
            ("glipizide", &[T2DM]),
            ("glyburide", &[T2DM]),
            ("lisinopril", &[HYPERTENSION]),
            ("atorvastatin", &[HYPERLIPIDEMIA]),
            ("amlodipine", &[HYPERTENSION]),
            ("aspirin", &[CAD]),
            ("warfarin", &[AFIB]),
            ("clopidogrel", &[CAD]),
            ("albuterol", &[ASTHMA]),
            ("montelukast", &[ASTHMA]),
            ("fluticasone", &[ASTHMA]),
            ("omeprazole", &[GERD]),
            ("pantoprazole", &[GERD]),
            ("levothyroxine", &[HYPOTHYROIDISM]),
            ("sertraline", &[DEPRESSION]),
            ("escitalopram", &[DEPRESSION]),
            ("tramadol", &[CHRONIC_PAIN]),
            ("gabapentin", &[CHRONIC_PAIN]),
            ("amoxicillin", &[URI]),
            ("azithromycin", &[URI]),
            ("ciprofloxacin", &[UTI]),
        ])
    }

    /// Indication table behind the drug indications endpoint.
    pub fn indications() -> Self {
        Self::from_pairs(&[
            (
                "metformin",
                &[T2DM, ("E11.65", "Type 2 diabetes mellitus with hyperglycemia")],
            ),
            ("insulin", &[T1DM, T2DM]),
            ("amlodipine", &[HYPERTENSION]),
            ("atorvastatin", &[HYPERLIPIDEMIA, ("E78.2", "Mixed hyperlipidemia")]),
            ("omeprazole", &[GERD]),
            ("pantoprazole", &[GERD]),
            ("aspirin", &[CAD]),
            ("albuterol", &[ASTHMA]),
            ("levothyroxine", &[HYPOTHYROIDISM]),
            ("warfarin", &[AFIB]),
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Single best match: the exact key if present, otherwise the first key
    /// that contains or is contained in the term.
    pub fn lookup(&self, term: &str) -> Option<&[CodeEntry]> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|(key, _)| *key == term)
            .or_else(|| self.entries.iter().find(|(key, _)| is_partial(key, &term)))
            .map(|(_, codes)| codes.as_slice())
    }

    /// Every mapping for the term: the exact key alone, or all partial
    /// matches concatenated. Codes are unique in the result.
    pub fn lookup_all(&self, term: &str, max: usize) -> Vec<CodeEntry> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }

        let collected: Vec<&CodeEntry> = match self.entries.iter().find(|(key, _)| *key == term) {
            Some((_, codes)) => codes.iter().collect(),
            None => self
                .entries
                .iter()
                .filter(|(key, _)| is_partial(key, &term))
                .flat_map(|(_, codes)| codes.iter())
                .collect(),
        };

        let mut seen = HashSet::new();
        collected
            .into_iter()
            .filter(|entry| seen.insert(entry.code.clone()))
            .take(max)
            .cloned()
            .collect()
    }
}

fn is_partial(key: &str, term: &str) -> bool {
    key.contains(term) || term.contains(key)
}

/// Drug keywords for the three-character prefix of an ICD-10 code.
pub fn drug_keywords_for_code(icd10_code: &str) -> &'static [&'static str] {
    let prefix: String = icd10_code.trim().to_uppercase().chars().take(3).collect();
    PREFIX_KEYWORDS
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

/// The mapping table as one step of a source chain.
pub struct LocalStrategy {
    table: Arc<LocalMappingTable>,
    label: &'static str,
}

impl LocalStrategy {
    pub fn leading(table: Arc<LocalMappingTable>) -> Self {
        Self {
            table,
            label: SOURCE_LOCAL_MAPPING,
        }
    }

    pub fn trailing(table: Arc<LocalMappingTable>) -> Self {
        Self {
            table,
            label: SOURCE_LOCAL_FALLBACK,
        }
    }
}

#[async_trait]
impl LookupStrategy for LocalStrategy {
    fn name(&self) -> &str {
        self.label
    }

    fn is_remote(&self) -> bool {
        false
    }

    async fn lookup(&self, term: &str) -> Vec<CodeEntry> {
        self.table
            .lookup(term)
            .map(|codes| codes.to_vec())
            .unwrap_or_default()
    }
}
