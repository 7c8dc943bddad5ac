mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{mocked_external, TestApp};
use httpmock::prelude::*;
use serde_json::json;

async fn mock_rxnorm(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rxnav/drugs.json")
                .query_param("name", "metformin");
            then.status(200).json_body(json!({
                "drugGroup": {
                    "conceptGroup": [
                        {"tty": "IN"},
                        {
                            "tty": "SCD",
                            "conceptProperties": [
                                {"rxcui": "861007", "name": "metformin hydrochloride 500 MG Oral Tablet", "synonym": "", "tty": "SCD", "language": "ENG"}
                            ]
                        }
                    ]
                }
            }));
        })
        .await
}

async fn mock_chembl(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/chembl/molecule.json")
                .query_param("pref_name__icontains", "metformin");
            then.status(200).json_body(json!({
                "molecules": [{
                    "molecule_chembl_id": "CHEMBL1431",
                    "pref_name": "METFORMIN",
                    "max_phase": 4,
                    "therapeutic_flag": true,
                    "molecule_type": "Small molecule",
                    "molecule_properties": {"full_molformula": "C4H11N5", "full_mwt": "129.17", "alogp": "-1.03"}
                }]
            }));
        })
        .await
}

#[tokio::test]
async fn test_combined_search_isolates_failing_provider() -> Result<()> {
    let server = MockServer::start_async().await;
    let openfda = server
        .mock_async(|when, then| {
            when.method(GET).path("/fda/drug/label.json");
            then.status(500).body("upstream exploded");
        })
        .await;
    mock_rxnorm(&server).await;
    mock_chembl(&server).await;

    let app = TestApp::with_config(&mocked_external(&server))?;
    let (status, body) = app.get("/api/external/combined-search/metformin").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["drugName"], "metformin");

    let sources = &body["sources"];
    assert_eq!(sources["openFDA"]["results"], json!([]));
    assert_eq!(sources["openFDA"]["total"], 0);
    assert_eq!(sources["openFDA"]["note"], "unavailable");

    assert_eq!(sources["rxNorm"]["total"], 1);
    assert_eq!(sources["rxNorm"]["results"][0]["rxcui"], "861007");
    assert!(sources["rxNorm"].get("note").is_none());

    assert_eq!(sources["chembl"]["total"], 1);
    assert_eq!(sources["chembl"]["results"][0]["chemblId"], "CHEMBL1431");

    // every label strategy was attempted before giving up
    openfda.assert_hits_async(4).await;
    Ok(())
}

#[tokio::test]
async fn test_combined_search_only_queries_requested_providers() -> Result<()> {
    let server = MockServer::start_async().await;
    let rxnorm = mock_rxnorm(&server).await;
    let chembl = mock_chembl(&server).await;

    let app = TestApp::with_config(&mocked_external(&server))?;
    let (_, body) = app
        .get("/api/external/combined-search/metformin?apis=rxnorm")
        .await?;

    let sources = body["sources"].as_object().cloned().unwrap_or_default();
    assert_eq!(sources.keys().collect::<Vec<_>>(), vec!["rxNorm"]);
    rxnorm.assert_hits_async(1).await;
    chembl.assert_hits_async(0).await;
    Ok(())
}

#[tokio::test]
async fn test_openfda_labels_with_details() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fda/drug/label.json")
                .query_param("limit", "2");
            then.status(200).json_body(json!({
                "results": [{
                    "openfda": {
                        "brand_name": ["Glucophage"],
                        "generic_name": ["METFORMIN HYDROCHLORIDE"],
                        "route": ["ORAL"]
                    },
                    "indications_and_usage": ["Adjunct to diet and exercise in type 2 diabetes."]
                }]
            }));
        })
        .await;

    let app = TestApp::with_config(&mocked_external(&server))?;
    let (status, body) = app
        .get("/api/external/openfda/drug-labels/metformin?limit=2")
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "OpenFDA");
    assert_eq!(body["drugName"], "metformin");
    assert_eq!(body["total"], 1);

    let label = &body["labels"][0];
    assert_eq!(label["brandName"], "Glucophage");
    assert_eq!(label["manufacturer"], "Unknown");
    assert_eq!(label["route"], "ORAL");
    assert_eq!(label["warnings"], "Not available");
    Ok(())
}

#[tokio::test]
async fn test_standalone_endpoints_swallow_failures() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rxnav/drugs.json");
            then.status(502);
        })
        .await;
    mock_chembl(&server).await;

    let app = TestApp::with_config(&mocked_external(&server))?;

    let (status, body) = app.get("/api/external/rxnorm/search/metformin").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["drugs"], json!([]));
    assert_eq!(body["note"], "unavailable");

    let (status, body) = app.get("/api/external/chembl/search/metformin").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "metformin");
    assert_eq!(body["molecules"][0]["molecularFormula"], "C4H11N5");
    Ok(())
}

#[tokio::test]
async fn test_external_health_lists_bases() -> Result<()> {
    let server = MockServer::start_async().await;
    let app = TestApp::with_config(&mocked_external(&server))?;

    let (_, body) = app.get("/api/external/health").await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["apis"]["rxNorm"], server.url("/rxnav"));
    Ok(())
}

#[tokio::test]
async fn test_adverse_events_route() -> Result<()> {
    let server = MockServer::start_async().await;
    let events = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fda/drug/event.json")
                .query_param("limit", "3");
            then.status(200).json_body(json!({
                "results": [{
                    "receiptdate": "20230611",
                    "serious": "2",
                    "patient": {
                        "patientonsetage": "54",
                        "reaction": [{"reactionmeddrapt": "Lactic acidosis", "reactionoutcome": "6"}]
                    }
                }]
            }));
        })
        .await;

    let app = TestApp::with_config(&mocked_external(&server))?;
    let (status, body) = app
        .get("/api/external/openfda/adverse-events/metformin?limit=3")
        .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "OpenFDA");
    assert_eq!(body["drugName"], "metformin");
    assert_eq!(body["total"], 1);
    let event = &body["adverseEvents"][0];
    assert_eq!(event["receiptDate"], "20230611");
    assert_eq!(event["patientAge"], "54");
    assert_eq!(event["patientSex"], "Unknown");
    assert_eq!(event["reactions"][0]["term"], "Lactic acidosis");
    events.assert_hits_async(1).await;
    Ok(())
}

#[tokio::test]
async fn test_adverse_events_all_404_is_empty_without_note() -> Result<()> {
    let server = MockServer::start_async().await;
    let events = server
        .mock_async(|when, then| {
            when.method(GET).path("/fda/drug/event.json");
            then.status(404);
        })
        .await;

    let app = TestApp::with_config(&mocked_external(&server))?;
    let (status, body) = app.get("/api/external/openfda/adverse-events/zzqx").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adverseEvents"], json!([]));
    assert_eq!(body["total"], 0);
    assert!(body.get("note").is_none());
    events.assert_hits_async(4).await;
    Ok(())
}

#[tokio::test]
async fn test_rxnorm_interactions_route() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rxnav/interaction/interaction.json")
                .query_param("rxcui", "11289");
            then.status(200).json_body(json!({
                "interactionTypeGroup": [{
                    "interactionType": [{
                        "interactionPair": [{
                            "interactionConcept": [{"minConceptItem": {"rxcui": "11289", "name": "warfarin", "tty": "IN"}}],
                            "severity": "high",
                            "description": "Increased risk of bleeding."
                        }]
                    }]
                }]
            }));
        })
        .await;

    let app = TestApp::with_config(&mocked_external(&server))?;
    let (status, body) = app.get("/api/external/rxnorm/interactions/11289").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "RxNorm");
    assert_eq!(body["rxcui"], "11289");
    assert_eq!(body["total"], 1);
    assert_eq!(body["interactions"][0]["severity"], "high");
    assert_eq!(body["interactions"][0]["interactionConcept"]["name"], "warfarin");
    Ok(())
}

#[tokio::test]
async fn test_chembl_targets_route_swallows_failure() -> Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/chembl/molecule/CHEMBL1431/mechanism.json");
            then.status(200).json_body(json!({
                "mechanisms": [{
                    "target_chembl_id": "CHEMBL2111320",
                    "mechanism_of_action": "Electron transport complex I inhibitor",
                    "action_type": "INHIBITOR",
                    "target_type": "PROTEIN COMPLEX"
                }]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/chembl/molecule/CHEMBL0/mechanism.json");
            then.status(500);
        })
        .await;

    let app = TestApp::with_config(&mocked_external(&server))?;

    let (status, body) = app.get("/api/external/chembl/targets/CHEMBL1431").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chemblId"], "CHEMBL1431");
    assert_eq!(body["targets"][0]["targetName"], "CHEMBL2111320");
    assert_eq!(body["targets"][0]["actionType"], "INHIBITOR");

    let (status, body) = app.get("/api/external/chembl/targets/CHEMBL0").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["targets"], json!([]));
    assert_eq!(body["note"], "unavailable");
    Ok(())
}

#[tokio::test]
async fn test_plain_openfda_and_rxnorm_drug_routes() -> Result<()> {
    let server = MockServer::start_async().await;
    let labels = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/fda/drug/label.json")
                .query_param("search", "openfda.brand_name:\"Glucophage\"")
                .query_param("limit", "10");
            then.status(200).json_body(json!({
                "meta": {"results": {"total": 1}},
                "results": [{"id": "label-1", "openfda": {"brand_name": ["Glucophage"]}}]
            }));
        })
        .await;
    mock_rxnorm(&server).await;

    let app = TestApp::with_config(&mocked_external(&server))?;

    let (status, body) = app.get("/api/openfda/drugs?query=Glucophage").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "OpenFDA");
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["id"], "label-1");
    labels.assert_hits_async(1).await;

    let (status, body) = app.get("/api/rxnorm/drugs?query=metformin").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "RxNorm");
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"][1]["tty"], "SCD");

    let (status, body) = app.get("/api/rxnorm/drugs").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Query parameter required"}));
    Ok(())
}
