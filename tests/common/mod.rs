#![allow(dead_code)]

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pharm_lookup::{build_router, AppConfig, AppState};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;

pub const REGISTRY_CSV: &str = "Package Name,Generic Name,Strength,Dosage Form,Package Size,Status,Manufacturer Name,Agent Name,Package Price to Public,Package Price to Pharmacy,Unit Price to Public,Included in Thiqa/ ABM - other than 1&7- Drug Formulary,Included In Basic Drug Formulary,Included In ABM 1 Drug Formulary,Included In ABM 7 Drug Formulary
GLUCOPHAGE 500MG,Metformin Hydrochloride,500mg,Film-coated tablet,50,Active,Merck Serono,Agent A,12.50,10.00,0.25,Yes,No,Yes,No
NORVASC 5MG,Amlodipine,5mg,Tablet,30,Active,Pfizer,Agent C,40.00,32.00,1.33,Yes,Yes,No,No
OLDPHAGE,Metformin,850mg,Tablet,30,Inactive,Generic Co,Agent D,5,4,0.2,No,No,No,No
VENTOLIN INHALER,Salbutamol,100mcg,Inhaler,1,Active,GSK,Agent E,20.00,16.00,20.00,No,Yes,No,Yes
";

pub const FORMULARY_JSON: &str = r#"{
  "medications": [
    {"name": "Lipitor", "activeIngredient": "Atorvastatin", "tier": 2},
    {"name": "Nexium", "activeIngredient": "Esomeprazole", "tier": 3}
  ]
}"#;

pub const ICD10_JSON: &str = r#"{
  "endocrine": [
    {"code": "E11.9", "description": "Type 2 diabetes mellitus without complications"},
    {"code": "E10.9", "description": "Type 1 diabetes mellitus without complications"}
  ],
  "circulatory": [
    {"code": "I10", "description": "Essential (primary) hypertension"}
  ]
}"#;

/// A router over temp datasets. The directory lives as long as the app.
pub struct TestApp {
    pub router: Router,
    _data_dir: TempDir,
}

impl TestApp {
    /// Writes the sample datasets and builds the app from `extra_toml`
    /// appended to a `[data]` section pointing at them.
    pub fn with_config(extra_toml: &str) -> Result<Self> {
        let data_dir = TempDir::new()?;
        fs::write(data_dir.path().join("UAE drug list.csv"), REGISTRY_CSV)?;
        fs::write(data_dir.path().join("daman-formulary.json"), FORMULARY_JSON)?;
        fs::write(data_dir.path().join("icd10-data.json"), ICD10_JSON)?;

        let dir = data_dir.path().to_string_lossy().replace('\\', "/");
        let toml = format!("[data]\ndir = \"{}\"\n\n{}", dir, extra_toml);
        let config = AppConfig::from_toml_str(&toml)?;
        config.validate_config()?;

        let state = AppState::bootstrap(&config)?;
        Ok(Self {
            router: build_router(state),
            _data_dir: data_dir,
        })
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        let request = Request::builder().uri(uri).body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;

        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }
}

/// `[sources.*]` overrides sending every ICD-10 source to the mock server.
pub fn mocked_sources(server: &httpmock::MockServer) -> String {
    format!(
        r#"
[sources.nih]
endpoint = "{}"

[sources.icd10api]
endpoint = "{}"

[sources.who]
endpoint = "{}"

[sources.openfda]
endpoint = "{}"
"#,
        server.url("/nih?terms={term}"),
        server.url("/icd10api?s={term}"),
        server.url("/who?q={term}"),
        server.url("/openfda?search={term}"),
    )
}

/// `[external]` bases pointing the pharma clients at the mock server.
pub fn mocked_external(server: &httpmock::MockServer) -> String {
    format!(
        r#"
[external]
openfda_base = "{}"
rxnorm_base = "{}"
chembl_base = "{}"
timeout_seconds = 2
"#,
        server.url("/fda"),
        server.url("/rxnav"),
        server.url("/chembl"),
    )
}
