mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestApp;
use pharm_lookup::{build_router, AppConfig, AppState};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_drug_search_returns_active_matches_only() -> Result<()> {
    let app = TestApp::with_config("")?;

    let (status, body) = app.get("/api/drug-service/search?query=metformin").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["query"], "metformin");
    assert_eq!(body["results"][0]["drug_name"], "GLUCOPHAGE 500MG");
    assert_eq!(body["results"][0]["thiqa_coverage"], true);
    assert_eq!(body["results"][0]["basic_coverage"], false);

    let (_, body) = app.get("/api/drug-service/search?category=tablet&limit=abc").await?;
    assert_eq!(body["total"], 2);

    let (_, body) = app.get("/api/drug-service/search?limit=1").await?;
    assert_eq!(body["total"], 1);
    Ok(())
}

#[tokio::test]
async fn test_drug_detail_and_categories() -> Result<()> {
    let app = TestApp::with_config("")?;

    let (status, body) = app.get("/api/drug-service/drugs/2").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["drug_name"], "NORVASC 5MG");
    assert_eq!(body["price_pharmacy"], "32.00");
    assert_eq!(body["abm1_coverage"], false);
    assert_eq!(body["status"], "Active");

    let (status, body) = app.get("/api/drug-service/drugs/999").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Drug not found"}));

    let (_, body) = app.get("/api/drug-service/categories").await?;
    assert_eq!(
        body,
        json!({"categories": ["Film-coated tablet", "Inhaler", "Tablet"]})
    );
    Ok(())
}

#[tokio::test]
async fn test_coverage_prefers_registry_then_formulary() -> Result<()> {
    let app = TestApp::with_config("")?;

    let (status, body) = app.get("/api/daman-service/coverage?drug=ventolin").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "VENTOLIN INHALER");
    assert_eq!(body["thiqa"], false);
    assert_eq!(body["basic"], true);
    assert_eq!(body["enhanced"], true);
    assert_eq!(body["priorAuthorization"], false);

    let (status, body) = app.get("/api/daman-service/coverage?drug=atorvastatin").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"name": "Lipitor", "activeIngredient": "Atorvastatin", "tier": 2})
    );

    let (status, body) = app.get("/api/daman-service/coverage?drug=unobtainium").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Medication not found in formulary"}));

    let (status, _) = app.get("/api/daman-service/coverage").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_uae_drugs_search() -> Result<()> {
    let app = TestApp::with_config("")?;

    let (status, body) = app.get("/api/uae-drugs?q=pfizer").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["name"], "NORVASC 5MG");
    assert_eq!(body["results"][0]["dispenseMode"], "Available");
    assert!(body["timestamp"].is_string());

    let (_, body) = app.get("/api/uae-drugs?q=phage").await?;
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"][1]["dispenseMode"], "Discontinued");

    let (status, _) = app.get("/api/uae-drugs?q=a").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_uae_drugs_without_registry_is_unavailable() -> Result<()> {
    let config = AppConfig::from_toml_str("[data]\ndir = \"/nonexistent/pharm-data\"\n")?;
    let router = build_router(AppState::bootstrap(&config)?);

    let request = axum::http::Request::builder()
        .uri("/api/uae-drugs?q=metformin")
        .body(axum::body::Body::empty())?;
    let response = router.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn test_formulary_listing_and_search() -> Result<()> {
    let app = TestApp::with_config("")?;

    let (_, body) = app.get("/api/formulary").await?;
    assert_eq!(body["total"], 2);

    let (_, body) = app.get("/api/formulary?drug=esomep").await?;
    assert_eq!(body["total"], 1);
    assert_eq!(body["medications"][0]["name"], "Nexium");
    Ok(())
}

#[tokio::test]
async fn test_interactions_and_pregnancy() -> Result<()> {
    let app = TestApp::with_config("")?;

    let (status, body) = app.get("/api/drug-interactions?drug1=warfarin&drug2=aspirin").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interaction"]["severity"], "severe");

    let (_, body) = app.get("/api/drug-interactions?drug1=aspirin&drug2=warfarin").await?;
    assert_eq!(body["interaction"]["severity"], "severe");

    let (_, body) = app.get("/api/drug-interactions?drug1=warfarin").await?;
    assert!(body["interactions"]["warfarin"]["aspirin"].is_object());

    let (_, body) = app.get("/api/drug-interactions?drug1=water&drug2=salt").await?;
    assert_eq!(
        body,
        json!({"message": "No known interaction between these medications"})
    );

    let (status, body) = app.get("/api/drug-interactions").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "At least one drug name is required"}));

    let (_, body) = app.get("/api/pregnancy-categories?drug=Atorvastatin").await?;
    assert_eq!(body["result"]["category"], "X");
    assert!(body["result"]["categoryDescription"].is_string());

    let (_, body) = app.get("/api/pregnancy-categories?drug=unobtainium").await?;
    assert!(body["message"].is_string());
    assert!(body["categories"]["A"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_health_reports_datasets_and_chains() -> Result<()> {
    let app = TestApp::with_config("")?;

    let (status, body) = app.get("/api/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["name"], "pharm-lookup");
    assert_eq!(body["dataLoaded"]["uaeDrugs"]["count"], 4);
    assert_eq!(body["dataLoaded"]["uaeDrugs"]["loaded"], true);
    assert_eq!(body["dataLoaded"]["damanFormulary"]["count"], 2);
    assert_eq!(body["dataLoaded"]["icd10Codes"]["count"], 3);
    assert_eq!(body["chains"]["drug_icd10"], json!(["Local Mapping", "NIH Clinical Tables"]));
    Ok(())
}
