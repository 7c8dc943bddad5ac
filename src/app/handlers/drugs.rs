use super::{parse_limit, timestamp};
use crate::app::state::AppState;
use crate::domain::model::{DrugFilter, DrugRecord};
use crate::utils::error::{LookupError, Result};
use crate::utils::validation::required_term;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_SEARCH_LIMIT: usize = 20;
const DEFAULT_UAE_LIMIT: usize = 10;
const MIN_UAE_QUERY_CHARS: usize = 2;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DrugParams {
    pub drug: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UaeParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

fn or_else<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn search_view(drug: &DrugRecord) -> Value {
    json!({
        "id": drug.id,
        "drug_name": or_else(&drug.package_name, "Unknown"),
        "generic_name": or_else(&drug.generic_name, "Unknown"),
        "category": or_else(&drug.dosage_form, "Medication"),
        "strength": drug.strength,
        "dosage_form": drug.dosage_form,
        "manufacturer": drug.manufacturer,
        "agent": drug.agent,
        "price_public": drug.price_public,
        "thiqa_coverage": drug.thiqa_coverage(),
        "basic_coverage": drug.basic_coverage(),
    })
}

fn detail_view(drug: &DrugRecord) -> Value {
    let now = timestamp();
    json!({
        "id": drug.id,
        "drug_name": or_else(&drug.package_name, "Unknown"),
        "generic_name": or_else(&drug.generic_name, "Unknown"),
        "category": or_else(&drug.dosage_form, "Medication"),
        "strength": drug.strength,
        "dosage_form": drug.dosage_form,
        "package_size": drug.package_size,
        "manufacturer": drug.manufacturer,
        "agent": drug.agent,
        "price_public": drug.price_public,
        "price_pharmacy": drug.price_pharmacy,
        "unit_price_public": drug.unit_price_public,
        "thiqa_coverage": drug.thiqa_coverage(),
        "basic_coverage": drug.basic_coverage(),
        "abm1_coverage": drug.abm1_coverage(),
        "abm7_coverage": drug.abm7_coverage(),
        "status": drug.status,
        "created_at": now,
        "updated_at": now,
    })
}

/// Active drugs matching name and dosage-form filters.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>> {
    let query = params.query.unwrap_or_default().trim().to_string();
    let filter = DrugFilter {
        query: Some(query.clone()),
        category: params.category.map(|c| c.trim().to_string()),
        active_only: true,
    };
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_SEARCH_LIMIT);

    let drugs = state.drug_store.find(&filter, limit).await?;
    let results: Vec<Value> = drugs.iter().map(search_view).collect();

    Ok(Json(json!({
        "total": results.len(),
        "results": results,
        "query": query,
    })))
}

pub async fn get_drug(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let drug = state
        .drug_store
        .get(&id)
        .await?
        .ok_or_else(|| LookupError::not_found("Drug not found"))?;

    Ok(Json(detail_view(&drug)))
}

pub async fn categories(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "categories": state.registry().categories() }))
}

/// Insurance coverage: the registry answers first, the formulary second.
pub async fn coverage(
    State(state): State<AppState>,
    Query(params): Query<DrugParams>,
) -> Result<Json<Value>> {
    let drug_name = required_term("drug", params.drug.as_deref(), "Drug name is required")?;

    if let Some(drug) = state.registry().find_by_name(&drug_name) {
        return Ok(Json(json!({
            "name": drug.package_name,
            "activeIngredient": drug.generic_name,
            "dosageForm": drug.dosage_form,
            "strength": drug.strength,
            "thiqa": drug.thiqa_coverage(),
            "basic": drug.basic_coverage(),
            "enhanced": drug.abm1_coverage() || drug.abm7_coverage(),
            "priorAuthorization": false,
            "price_public": drug.price_public,
            "manufacturer": drug.manufacturer,
        })));
    }

    let medication = state
        .data
        .formulary
        .find_exact(&drug_name)
        .ok_or_else(|| LookupError::not_found("Medication not found in formulary"))?;

    Ok(Json(serde_json::to_value(medication)?))
}

/// Registry search over package, generic and manufacturer names.
pub async fn uae_drugs(
    State(state): State<AppState>,
    Query(params): Query<UaeParams>,
) -> Result<Json<Value>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.chars().count() < MIN_UAE_QUERY_CHARS {
        return Err(LookupError::missing_parameter(
            "q",
            "Query parameter required: provide at least 2 characters",
        ));
    }

    let registry = state.registry();
    if registry.is_empty() {
        return Err(LookupError::Unavailable {
            message: "Drug database not available".to_string(),
        });
    }

    let limit = parse_limit(params.limit.as_deref(), DEFAULT_UAE_LIMIT);
    let results: Vec<Value> = registry
        .search_any(query, limit)
        .into_iter()
        .map(|drug| {
            json!({
                "name": or_else(&drug.package_name, "Unknown"),
                "genericName": or_else(&drug.generic_name, "Unknown"),
                "strength": or_else(&drug.strength, "N/A"),
                "dosageForm": or_else(&drug.dosage_form, "N/A"),
                "drugCode": or_else(&drug.agent, "N/A"),
                "manufacturer": or_else(&drug.manufacturer, "N/A"),
                "packageSize": or_else(&drug.package_size, "N/A"),
                "dispenseMode": if drug.is_active() { "Available" } else { "Discontinued" },
                "packagePricePublic": or_else(&drug.price_public, "N/A"),
                "unitPricePublic": or_else(&drug.unit_price_public, "N/A"),
                "thiqa": drug.thiqa_coverage(),
                "basic": drug.basic_coverage(),
                "priorAuthorization": false,
            })
        })
        .collect();

    Ok(Json(json!({
        "total": results.len(),
        "results": results,
        "query": query,
        "timestamp": timestamp(),
    })))
}

/// The whole formulary, or the medications matching `drug`.
pub async fn formulary(
    State(state): State<AppState>,
    Query(params): Query<DrugParams>,
) -> Json<Value> {
    let formulary = &state.data.formulary;

    match params.drug.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(drug) => {
            let medications = formulary.search(drug);
            Json(json!({
                "total": medications.len(),
                "medications": medications,
                "query": drug,
            }))
        }
        None => Json(json!({
            "total": formulary.len(),
            "medications": formulary.medications(),
        })),
    }
}
