use super::{parse_limit, timestamp};
use crate::adapters::pharma::ProviderSection;
use crate::app::state::AppState;
use crate::utils::error::Result;
use crate::utils::validation::required_term;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const DEFAULT_LIMIT: usize = 10;
const COMBINED_LIMIT: usize = 5;
const ALL_PROVIDERS: [&str; 3] = ["openfda", "rxnorm", "chembl"];
const BRAND_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CombinedParams {
    pub apis: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub query: Option<String>,
}

/// Renders a section under the provider's own result key.
fn standalone<T: Serialize>(
    section: ProviderSection<T>,
    subject_key: &str,
    subject: &str,
    results_key: &str,
) -> Json<Value> {
    let mut body = Map::new();
    body.insert("source".into(), json!(section.source));
    body.insert(subject_key.into(), json!(subject));
    body.insert(results_key.into(), json!(section.results));
    body.insert("total".into(), json!(section.total));
    if let Some(note) = section.note {
        body.insert("note".into(), json!(note));
    }
    body.insert("timestamp".into(), json!(timestamp()));
    Json(Value::Object(body))
}

pub async fn openfda_labels(
    State(state): State<AppState>,
    Path(drug_name): Path<String>,
    Query(params): Query<LimitParams>,
) -> Json<Value> {
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_LIMIT);
    let result = state
        .pharma
        .openfda
        .label_summaries(&drug_name, limit, true)
        .await;

    standalone(
        ProviderSection::from_result("OpenFDA", result),
        "drugName",
        &drug_name,
        "labels",
    )
}

pub async fn openfda_adverse_events(
    State(state): State<AppState>,
    Path(drug_name): Path<String>,
    Query(params): Query<LimitParams>,
) -> Json<Value> {
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_LIMIT);
    let result = state.pharma.openfda.adverse_events(&drug_name, limit).await;

    standalone(
        ProviderSection::from_result("OpenFDA", result),
        "drugName",
        &drug_name,
        "adverseEvents",
    )
}

pub async fn rxnorm_search(
    State(state): State<AppState>,
    Path(drug_name): Path<String>,
) -> Json<Value> {
    let result = state.pharma.rxnorm.search(&drug_name).await;

    standalone(
        ProviderSection::from_result("RxNorm", result),
        "query",
        &drug_name,
        "drugs",
    )
}

pub async fn rxnorm_interactions(
    State(state): State<AppState>,
    Path(rxcui): Path<String>,
) -> Json<Value> {
    let result = state.pharma.rxnorm.interactions(&rxcui).await;

    standalone(
        ProviderSection::from_result("RxNorm", result),
        "rxcui",
        &rxcui,
        "interactions",
    )
}

pub async fn chembl_search(
    State(state): State<AppState>,
    Path(drug_name): Path<String>,
    Query(params): Query<LimitParams>,
) -> Json<Value> {
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_LIMIT);
    let result = state.pharma.chembl.search(&drug_name, limit).await;

    standalone(
        ProviderSection::from_result("ChEMBL", result),
        "query",
        &drug_name,
        "molecules",
    )
}

pub async fn chembl_targets(
    State(state): State<AppState>,
    Path(chembl_id): Path<String>,
) -> Json<Value> {
    let result = state.pharma.chembl.targets(&chembl_id).await;

    standalone(
        ProviderSection::from_result("ChEMBL", result),
        "chemblId",
        &chembl_id,
        "targets",
    )
}

/// `/api/openfda/drugs`: brand-name label documents, unmapped.
pub async fn openfda_drugs(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Value>> {
    let query = required_term("query", params.query.as_deref(), "Query parameter required")?;
    let result = state
        .pharma
        .openfda
        .brand_labels(&query, BRAND_SEARCH_LIMIT)
        .await;

    Ok(standalone(
        ProviderSection::from_result("OpenFDA", result),
        "query",
        &query,
        "results",
    ))
}

/// `/api/rxnorm/drugs`: RxNorm concept groups, unmapped.
pub async fn rxnorm_drugs(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Value>> {
    let query = required_term("query", params.query.as_deref(), "Query parameter required")?;
    let result = state.pharma.rxnorm.concept_groups(&query).await;

    Ok(standalone(
        ProviderSection::from_result("RxNorm", result),
        "query",
        &query,
        "results",
    ))
}

/// Requested provider keys; an absent or blank list means all of them.
fn requested_providers(raw: Option<&str>) -> Vec<String> {
    let requested: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|api| api.trim().to_lowercase())
        .filter(|api| !api.is_empty())
        .collect();

    if requested.is_empty() {
        ALL_PROVIDERS.iter().map(|api| api.to_string()).collect()
    } else {
        requested
    }
}

/// Concurrent fan-out to the requested providers; all are joined before
/// the response is written.
pub async fn combined_search(
    State(state): State<AppState>,
    Path(drug_name): Path<String>,
    Query(params): Query<CombinedParams>,
) -> Json<Value> {
    let providers = requested_providers(params.apis.as_deref());
    let wants = |key: &str| providers.iter().any(|p| p == key);
    let pharma = &state.pharma;

    let openfda = async {
        if !wants("openfda") {
            return None;
        }
        let result = pharma
            .openfda
            .label_summaries(&drug_name, COMBINED_LIMIT, false)
            .await;
        Some(json!(ProviderSection::from_result("OpenFDA", result)))
    };
    let rxnorm = async {
        if !wants("rxnorm") {
            return None;
        }
        let result = pharma.rxnorm.search(&drug_name).await;
        Some(json!(ProviderSection::from_result("RxNorm", result)))
    };
    let chembl = async {
        if !wants("chembl") {
            return None;
        }
        let result = pharma.chembl.search(&drug_name, COMBINED_LIMIT).await;
        Some(json!(ProviderSection::from_result("ChEMBL", result)))
    };

    let (openfda, rxnorm, chembl) = tokio::join!(openfda, rxnorm, chembl);

    let mut sources = Map::new();
    for (key, section) in [("openFDA", openfda), ("rxNorm", rxnorm), ("chembl", chembl)] {
        if let Some(section) = section {
            sources.insert(key.to_string(), section);
        }
    }

    Json(json!({
        "drugName": drug_name,
        "sources": sources,
        "timestamp": timestamp(),
        "note": "Combined results from multiple pharmaceutical APIs",
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "apis": {
            "openFDA": state.pharma.openfda.base_url(),
            "rxNorm": state.pharma.rxnorm.base_url(),
            "chembl": state.pharma.chembl.base_url(),
        },
        "timestamp": timestamp(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_providers() {
        assert_eq!(requested_providers(None), vec!["openfda", "rxnorm", "chembl"]);
        assert_eq!(requested_providers(Some(" ,")), vec!["openfda", "rxnorm", "chembl"]);
        assert_eq!(
            requested_providers(Some("RxNorm, chembl")),
            vec!["rxnorm", "chembl"]
        );
    }
}
