use super::parse_limit;
use crate::app::state::AppState;
use crate::core::mapping::drug_keywords_for_code;
use crate::utils::error::Result;
use crate::utils::validation::required_term;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_SEARCH_LIMIT: usize = 20;
const MAX_INDICATIONS: usize = 8;
const MAX_DRUGS_PER_CODE: usize = 20;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LiveParams {
    pub terms: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CodesParams {
    pub drug: Option<String>,
}

/// Text search over the local ICD-10 catalog.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>> {
    let query = required_term("q", params.q.as_deref(), "Query parameter required")?;
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_SEARCH_LIMIT);

    let results = state.data.icd10.search(&query, limit);

    Ok(Json(json!({
        "total": results.len(),
        "results": results,
        "query": query,
    })))
}

/// Remote-first resolution with the local table as the last resort.
pub async fn live(
    State(state): State<AppState>,
    Query(params): Query<LiveParams>,
) -> Result<Json<Value>> {
    let terms = required_term("terms", params.terms.as_deref(), "Search terms required")?;
    let result = state.icd10_live.resolve(&terms).await;

    Ok(Json(json!({
        "results": result.entries,
        "source": result.source,
    })))
}

/// Drug name to ICD-10 codes, local table first.
pub async fn codes_for_drug(
    State(state): State<AppState>,
    Query(params): Query<CodesParams>,
) -> Result<Json<Value>> {
    let drug = required_term("drug", params.drug.as_deref(), "Drug name is required")?;
    let result = state.drug_icd10.resolve(&drug).await;

    Ok(Json(json!({
        "results": result.entries,
        "source": result.source,
    })))
}

pub async fn drug_indications(
    State(state): State<AppState>,
    Path(drug_name): Path<String>,
) -> Json<Value> {
    let mappings: Vec<Value> = state
        .indications
        .lookup_all(&drug_name, MAX_INDICATIONS)
        .into_iter()
        .map(|entry| {
            json!({
                "icd10_code": entry.code,
                "indication": entry.description,
            })
        })
        .collect();

    Json(json!({ "icd10_mappings": mappings }))
}

pub async fn drugs_for_code(
    State(state): State<AppState>,
    Path(icd10_code): Path<String>,
) -> Json<Value> {
    let keywords = drug_keywords_for_code(&icd10_code);

    let drugs: Vec<Value> = state
        .registry()
        .with_keywords(keywords, MAX_DRUGS_PER_CODE)
        .into_iter()
        .map(|drug| {
            json!({
                "id": drug.id,
                "name": drug.package_name,
                "generic": drug.generic_name,
                "strength": drug.strength,
                "form": drug.dosage_form,
            })
        })
        .collect();

    Json(json!({ "drugs": drugs }))
}
