use crate::domain::model::CodeEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Condition vocabulary scanned for in OpenFDA label indications.
const CONDITION_KEYWORDS: &[&str] = &[
    "diabetes",
    "hypertension",
    "depression",
    "asthma",
    "infection",
    "pain",
    "fever",
    "inflammation",
    "allergy",
    "cancer",
    "heart",
    "kidney",
    "liver",
    "lung",
    "brain",
    "blood",
    "bone",
    "skin",
    "eye",
    "ear",
    "nose",
    "throat",
    "arthritis",
    "migraine",
    "epilepsy",
    "anxiety",
    "insomnia",
    "nausea",
    "vomiting",
    "diarrhea",
    "constipation",
    "ulcer",
    "reflux",
    "cholesterol",
    "thyroid",
    "anemia",
    "clot",
    "stroke",
    "seizure",
];

const INDICATION_MIN_LEN: usize = 20;
const INDICATION_MAX_LEN: usize = 300;
const INDICATION_EXCERPT_LEN: usize = 200;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("unexpected payload shape: expected {expected}")]
    UnexpectedShape { expected: &'static str },
}

/// One variant per upstream body shape. A wrong top-level shape is a
/// [`ParseFailure`]; missing fields deeper down contribute nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderParser {
    /// `[count, codes, extra, [[code, name], ...]]`
    NihClinicalTables,
    /// `[{code|icd10_code, desc|description|name}, ...]`
    Icd10Api,
    /// `{destinationEntities: [{theCode, title}]}`
    WhoIcd,
    /// `{results: [{indications_and_usage: [text]}]}`, keyword heuristic
    OpenFdaIndications,
    /// `{drugGroup: {conceptGroup: [{conceptProperties: [{rxcui, name}]}]}}`
    RxNormConcepts,
}

impl ProviderParser {
    pub fn parse(&self, body: &Value) -> Result<Vec<CodeEntry>, ParseFailure> {
        let entries = match self {
            ProviderParser::NihClinicalTables => parse_nih(body)?,
            ProviderParser::Icd10Api => parse_icd10api(body)?,
            ProviderParser::WhoIcd => parse_who(body)?,
            ProviderParser::OpenFdaIndications => parse_openfda(body)?,
            ProviderParser::RxNormConcepts => parse_rxnorm(body)?,
        };

        Ok(entries.into_iter().filter(CodeEntry::is_complete).collect())
    }
}

fn parse_nih(body: &Value) -> Result<Vec<CodeEntry>, ParseFailure> {
    let parts = body.as_array().ok_or(ParseFailure::UnexpectedShape {
        expected: "top-level array",
    })?;

    let Some(pairs) = parts.get(3).and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(pairs
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_array()?;
            let code = pair.first()?.as_str()?;
            let description = pair.get(1)?.as_str()?;
            Some(CodeEntry::new(code, description))
        })
        .collect())
}

fn first_str<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

fn parse_icd10api(body: &Value) -> Result<Vec<CodeEntry>, ParseFailure> {
    let items = body.as_array().ok_or(ParseFailure::UnexpectedShape {
        expected: "top-level array",
    })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let code = first_str(item, &["code", "icd10_code"])?;
            let description = first_str(item, &["desc", "description", "name"])?;
            Some(CodeEntry::new(code, description))
        })
        .collect())
}

fn parse_who(body: &Value) -> Result<Vec<CodeEntry>, ParseFailure> {
    if !body.is_object() {
        return Err(ParseFailure::UnexpectedShape {
            expected: "top-level object",
        });
    }

    let Some(entities) = body.get("destinationEntities").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(entities
        .iter()
        .filter_map(|entity| {
            let code = entity.get("theCode")?.as_str()?;
            let title = entity.get("title")?.as_str()?;
            Some(CodeEntry::new(code, title))
        })
        .collect())
}

fn condition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let alternatives = CONDITION_KEYWORDS.join("|");
        Regex::new(&format!(r"(?i)\b({})(?:es|s)?\b", alternatives))
            .expect("condition keyword pattern is valid")
    })
}

/// Best-effort condition extraction from free label text. The result is an
/// approximation, not a coded mapping.
pub fn extract_conditions(indication: &str) -> Vec<CodeEntry> {
    let mut entries: Vec<CodeEntry> = condition_pattern()
        .captures_iter(indication)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            CodeEntry::new(
                "MED_CONDITION",
                format!("{} (medical condition from FDA label)", m.as_str().to_lowercase()),
            )
        })
        .collect();

    let length = indication.chars().count();
    if length > INDICATION_MIN_LEN && length < INDICATION_MAX_LEN {
        let excerpt: String = indication.chars().take(INDICATION_EXCERPT_LEN).collect();
        entries.push(CodeEntry::new("FDA_INDICATION", excerpt));
    }

    entries
}

fn parse_openfda(body: &Value) -> Result<Vec<CodeEntry>, ParseFailure> {
    if !body.is_object() {
        return Err(ParseFailure::UnexpectedShape {
            expected: "top-level object",
        });
    }

    let Some(results) = body.get("results").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    Ok(results
        .iter()
        .filter_map(|result| result.get("indications_and_usage")?.as_array())
        .flatten()
        .filter_map(Value::as_str)
        .flat_map(extract_conditions)
        .collect())
}

fn parse_rxnorm(body: &Value) -> Result<Vec<CodeEntry>, ParseFailure> {
    if !body.is_object() {
        return Err(ParseFailure::UnexpectedShape {
            expected: "top-level object",
        });
    }

    let Some(groups) = body
        .get("drugGroup")
        .and_then(|g| g.get("conceptGroup"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    Ok(groups
        .iter()
        .filter_map(|group| group.get("conceptProperties")?.as_array())
        .flatten()
        .filter_map(|concept| {
            let rxcui = concept.get("rxcui")?.as_str()?;
            let name = concept.get("name")?.as_str()?;
            Some(CodeEntry::new(
                format!("RXCUI_{}", rxcui),
                format!("{} (RxNorm concept)", name),
            ))
        })
        .collect())
}
