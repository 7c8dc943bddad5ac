use crate::app::state::AppState;
use crate::utils::error::Result;
use crate::utils::validation::required_term;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct InteractionParams {
    pub drug1: Option<String>,
    pub drug2: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PregnancyParams {
    pub drug: Option<String>,
}

/// One drug lists everything known for it; two drugs ask for the pair.
pub async fn interactions(
    State(state): State<AppState>,
    Query(params): Query<InteractionParams>,
) -> Result<Json<Value>> {
    let first = required_term(
        "drug1",
        params.drug1.as_deref(),
        "At least one drug name is required",
    )?;

    let second = params
        .drug2
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let Some(second) = second else {
        return Ok(Json(json!({
            "interactions": state.interactions.interactions_for(&first),
        })));
    };

    Ok(Json(match state.interactions.between(&first, second) {
        Some(interaction) => json!({ "interaction": interaction }),
        None => json!({ "message": "No known interaction between these medications" }),
    }))
}

pub async fn pregnancy(
    State(state): State<AppState>,
    Query(params): Query<PregnancyParams>,
) -> Result<Json<Value>> {
    let drug = required_term("drug", params.drug.as_deref(), "Drug name is required")?;

    Ok(Json(match state.pregnancy.lookup(&drug) {
        Some(profile) => json!({ "result": profile }),
        None => json!({
            "message": "No pregnancy category information found for this medication",
            "categories": state.pregnancy.categories(),
        }),
    }))
}
