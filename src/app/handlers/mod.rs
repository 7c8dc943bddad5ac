pub mod drugs;
pub mod external;
pub mod icd10;
pub mod safety;

use crate::app::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// Lenient limit parsing: absent, unparsable or zero falls back to the default.
pub(crate) fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(default)
}

pub(crate) fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let data = &state.data;

    Json(json!({
        "status": "ok",
        "application": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
        "dataLoaded": {
            "uaeDrugs": {
                "count": state.drug_store.count().await,
                "loaded": data.registry_status.loaded,
                "status": data.registry_status.label(),
            },
            "damanFormulary": {
                "count": data.formulary.len(),
                "loaded": data.formulary_status.loaded,
                "status": data.formulary_status.label(),
            },
            "icd10Codes": {
                "count": data.icd10.len(),
                "loaded": data.icd10_status.loaded,
                "status": data.icd10_status.label(),
            },
        },
        "chains": {
            "icd10_live": state.icd10_live.strategy_names(),
            "drug_icd10": state.drug_icd10.strategy_names(),
        },
        "timestamp": timestamp(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None, 20), 20);
        assert_eq!(parse_limit(Some("5"), 20), 5);
        assert_eq!(parse_limit(Some(" 7 "), 20), 7);
        assert_eq!(parse_limit(Some("0"), 20), 20);
        assert_eq!(parse_limit(Some("abc"), 20), 20);
        assert_eq!(parse_limit(Some("-3"), 10), 10);
    }
}
