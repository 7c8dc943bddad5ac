use crate::config::AppConfig;
use crate::utils::error::{LookupError, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const UNKNOWN: &str = "Unknown";
const NOT_AVAILABLE: &str = "Not available";

/// One provider's part of an external response. Failures become an empty
/// section with a note instead of an error.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSection<T> {
    pub source: &'static str,
    pub results: Vec<T>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<T> ProviderSection<T> {
    pub fn from_result(source: &'static str, result: Result<Vec<T>>) -> Self {
        match result {
            Ok(results) => Self {
                source,
                total: results.len(),
                results,
                note: None,
            },
            Err(e) => {
                tracing::warn!("⚠️ {} unavailable: {}", source, e);
                Self {
                    source,
                    results: Vec::new(),
                    total: 0,
                    note: Some("unavailable".to_string()),
                }
            }
        }
    }
}

fn first_string(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|v| v.as_array())
        .and_then(|items| items.first())
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDetails {
    pub route: String,
    pub indications: String,
    pub contraindications: String,
    pub warnings: String,
    pub adverse_reactions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSummary {
    pub brand_name: String,
    pub generic_name: String,
    pub manufacturer: String,
    pub dosage_form: String,
    #[serde(flatten)]
    pub details: Option<LabelDetails>,
}

impl LabelSummary {
    pub fn from_label(label: &Value, with_details: bool) -> Self {
        let openfda = |field: &str| {
            first_string(label, &format!("/openfda/{}", field)).unwrap_or_else(|| UNKNOWN.to_string())
        };
        let section = |field: &str| {
            first_string(label, &format!("/{}", field)).unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        Self {
            brand_name: openfda("brand_name"),
            generic_name: openfda("generic_name"),
            manufacturer: openfda("manufacturer_name"),
            dosage_form: openfda("dosage_form"),
            details: with_details.then(|| LabelDetails {
                route: openfda("route"),
                indications: section("indications_and_usage"),
                contraindications: section("contraindications"),
                warnings: section("warnings"),
                adverse_reactions: section("adverse_reactions"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reaction {
    pub term: Option<String>,
    pub outcome: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdverseEvent {
    pub receipt_date: Option<String>,
    pub serious: Value,
    pub patient_age: Value,
    pub patient_sex: Value,
    pub reactions: Vec<Reaction>,
}

impl AdverseEvent {
    pub fn from_report(report: &Value) -> Self {
        let patient = |key: &str| {
            report
                .pointer(&format!("/patient/{}", key))
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::String(UNKNOWN.to_string()))
        };
        let reactions = report
            .pointer("/patient/reaction")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|r| Reaction {
                        term: r.get("reactionmeddrapt").and_then(Value::as_str).map(str::to_string),
                        outcome: r.get("reactionoutcome").cloned().unwrap_or(Value::Null),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            receipt_date: report.get("receiptdate").and_then(Value::as_str).map(str::to_string),
            serious: report.get("serious").cloned().unwrap_or(Value::Null),
            patient_age: patient("patientonsetage"),
            patient_sex: patient("patientsex"),
            reactions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenFdaClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenFdaClient {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search expressions from most to least specific.
    pub fn label_strategies(query: &str) -> [String; 4] {
        [
            format!(
                "openfda.brand_name.exact:\"{q}\" OR openfda.generic_name.exact:\"{q}\"",
                q = query
            ),
            format!(
                "openfda.brand_name:\"{q}\" OR openfda.generic_name:\"{q}\" OR openfda.substance_name:\"{q}\"",
                q = query
            ),
            format!(
                "openfda.generic_name:{q}* OR openfda.brand_name:{q}* OR openfda.substance_name:{q}*",
                q = query
            ),
            format!("indications_and_usage:\"{q}\" OR description:\"{q}\"", q = query),
        ]
    }

    /// Adverse event search expressions from most to least specific.
    pub fn event_strategies(query: &str) -> [String; 4] {
        [
            format!("patient.drug.medicinalproduct.exact:\"{q}\"", q = query),
            format!("patient.drug.medicinalproduct:\"{q}\"", q = query),
            format!(
                "patient.drug.openfda.substance_name:\"{q}\" OR patient.drug.openfda.generic_name:\"{q}\"",
                q = query
            ),
            format!("patient.reaction.reactionmeddrapt:\"{q}\"", q = query),
        ]
    }

    /// Raw `results` documents for the first expression that answers. A 404
    /// means no hits for that expression and the next one is tried; when
    /// every expression fails and at least one failure was not a 404, that
    /// failure is returned.
    async fn first_answer(
        &self,
        endpoint: &str,
        expressions: &[String],
        limit: usize,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let limit = limit.to_string();
        let mut last_error: Option<LookupError> = None;

        for expression in expressions {
            let sent = self
                .client
                .get(&url)
                .query(&[("search", expression.as_str()), ("limit", limit.as_str())])
                .timeout(self.timeout)
                .send()
                .await;

            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                tracing::debug!("OpenFDA: no hits for {}", expression);
                continue;
            }
            if !status.is_success() {
                last_error = Some(LookupError::UpstreamStatus {
                    source_name: "OpenFDA".to_string(),
                    status: status.as_u16(),
                });
                continue;
            }

            let body: Value = response.json().await?;
            let results = body
                .get("results")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            return Ok(results);
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    pub async fn search_labels(&self, query: &str, limit: usize) -> Result<Vec<Value>> {
        self.first_answer("drug/label.json", &Self::label_strategies(query), limit)
            .await
    }

    /// Plain brand-name label search with no fallback expressions.
    pub async fn brand_labels(&self, query: &str, limit: usize) -> Result<Vec<Value>> {
        let expression = format!("openfda.brand_name:\"{}\"", query);
        self.first_answer("drug/label.json", &[expression], limit).await
    }

    pub async fn adverse_events(&self, query: &str, limit: usize) -> Result<Vec<AdverseEvent>> {
        let events = self
            .first_answer("drug/event.json", &Self::event_strategies(query), limit)
            .await?;
        Ok(events.iter().map(AdverseEvent::from_report).collect())
    }

    pub async fn label_summaries(
        &self,
        query: &str,
        limit: usize,
        with_details: bool,
    ) -> Result<Vec<LabelSummary>> {
        let labels = self.search_labels(query, limit).await?;
        Ok(labels
            .iter()
            .map(|label| LabelSummary::from_label(label, with_details))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RxNormConcept {
    pub rxcui: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synonym: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RxNormClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl RxNormClient {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::UpstreamStatus {
                source_name: "RxNorm".to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    /// The raw `conceptGroup` list for a name search.
    pub async fn concept_groups(&self, query: &str) -> Result<Vec<Value>> {
        let body = self.get_json("drugs.json", &[("name", query)]).await?;
        Ok(body
            .pointer("/drugGroup/conceptGroup")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<RxNormConcept>> {
        let groups = self.concept_groups(query).await?;
        let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(groups
            .iter()
            .filter_map(|group| group.get("conceptProperties").and_then(Value::as_array))
            .flatten()
            .filter_map(|concept| {
                Some(RxNormConcept {
                    rxcui: text(concept, "rxcui")?,
                    name: text(concept, "name")?,
                    synonym: text(concept, "synonym").filter(|s| !s.is_empty()),
                    tty: text(concept, "tty"),
                    language: text(concept, "language"),
                })
            })
            .collect())
    }

    /// Interaction pairs across every `interactionTypeGroup` for a concept.
    pub async fn interactions(&self, rxcui: &str) -> Result<Vec<RxInteraction>> {
        let body = self
            .get_json("interaction/interaction.json", &[("rxcui", rxcui)])
            .await?;

        let groups = body
            .get("interactionTypeGroup")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        // Pairs sit either directly on the group or under `interactionType`.
        let kinds = groups.iter().flat_map(|group| {
            group
                .get("interactionType")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_else(|| vec![group.clone()])
        });

        Ok(kinds
            .filter_map(|kind| kind.get("interactionPair").and_then(Value::as_array).cloned())
            .flatten()
            .map(|pair| RxInteraction::from_pair(&pair))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RxInteraction {
    pub interaction_concept: Value,
    pub severity: String,
    pub description: Option<String>,
}

impl RxInteraction {
    fn from_pair(pair: &Value) -> Self {
        Self {
            interaction_concept: pair
                .pointer("/interactionConcept/0/minConceptItem")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
            severity: pair
                .get("severity")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string(),
            description: pair.get("description").and_then(Value::as_str).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoleculeSummary {
    pub chembl_id: String,
    pub pref_name: Option<String>,
    pub molecular_formula: Value,
    pub molecular_weight: Value,
    pub logp: Value,
    pub max_phase: Value,
    pub therapeutic_flag: Option<bool>,
    pub molecule_type: Option<String>,
}

impl MoleculeSummary {
    fn from_molecule(molecule: &Value) -> Option<Self> {
        let property = |key: &str| {
            molecule
                .pointer(&format!("/molecule_properties/{}", key))
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::String(UNKNOWN.to_string()))
        };

        Some(Self {
            chembl_id: molecule.get("molecule_chembl_id")?.as_str()?.to_string(),
            pref_name: molecule
                .get("pref_name")
                .and_then(Value::as_str)
                .map(str::to_string),
            molecular_formula: property("full_molformula"),
            molecular_weight: property("full_mwt"),
            logp: property("alogp"),
            max_phase: molecule
                .get("max_phase")
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::String(UNKNOWN.to_string())),
            therapeutic_flag: molecule.get("therapeutic_flag").and_then(Value::as_bool),
            molecule_type: molecule
                .get("molecule_type")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChemblClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ChemblClient {
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::UpstreamStatus {
                source_name: "ChEMBL".to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<MoleculeSummary>> {
        let limit = limit.to_string();
        let body = self
            .get_json(
                "molecule.json",
                &[
                    ("pref_name__icontains", query),
                    ("limit", limit.as_str()),
                    ("format", "json"),
                ],
            )
            .await?;

        Ok(body
            .get("molecules")
            .and_then(Value::as_array)
            .map(|molecules| molecules.iter().filter_map(MoleculeSummary::from_molecule).collect())
            .unwrap_or_default())
    }

    /// Mechanisms of action recorded for a molecule.
    pub async fn targets(&self, chembl_id: &str) -> Result<Vec<DrugTarget>> {
        let endpoint = format!("molecule/{}/mechanism.json", chembl_id);
        let body = self.get_json(&endpoint, &[]).await?;

        Ok(body
            .get("mechanisms")
            .and_then(Value::as_array)
            .map(|mechanisms| mechanisms.iter().map(DrugTarget::from_mechanism).collect())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugTarget {
    pub target_name: Option<String>,
    pub mechanism_of_action: Option<String>,
    pub action_type: Option<String>,
    pub target_type: Option<String>,
}

impl DrugTarget {
    fn from_mechanism(mechanism: &Value) -> Self {
        let text = |key: &str| mechanism.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            target_name: text("target_chembl_id"),
            mechanism_of_action: text("mechanism_of_action"),
            action_type: text("action_type"),
            target_type: text("target_type"),
        }
    }
}

/// The three pharma clients, sharing one HTTP client.
#[derive(Debug, Clone)]
pub struct PharmaApis {
    pub openfda: OpenFdaClient,
    pub rxnorm: RxNormClient,
    pub chembl: ChemblClient,
}

impl PharmaApis {
    pub fn from_config(config: &AppConfig, client: Client) -> Self {
        let timeout = config.external_timeout();
        Self {
            openfda: OpenFdaClient::new(client.clone(), config.openfda_base(), timeout),
            rxnorm: RxNormClient::new(client.clone(), config.rxnorm_base(), timeout),
            chembl: ChemblClient::new(client, config.chembl_base(), timeout),
        }
    }
}
