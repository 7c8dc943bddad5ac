use crate::utils::error::{LookupError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(LookupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(LookupError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(LookupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// An endpoint template must be a valid URL once the placeholder is filled
/// and must actually contain the `{term}` placeholder.
pub fn validate_endpoint_template(field_name: &str, template: &str) -> Result<()> {
    if !template.contains("{term}") {
        return Err(LookupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: template.to_string(),
            reason: "Endpoint template must contain the {term} placeholder".to_string(),
        });
    }
    validate_url(field_name, &template.replace("{term}", "sample"))
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LookupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LookupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(LookupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LookupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LookupError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Request-side check for a lookup term: present and not blank.
pub fn required_term(name: &str, value: Option<&str>, message: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(term) if !term.is_empty() => Ok(term.to_string()),
        _ => Err(LookupError::missing_parameter(name, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("external.openfda_base", "https://api.fda.gov").is_ok());
        assert!(validate_url("external.openfda_base", "http://localhost:8080").is_ok());
        assert!(validate_url("external.openfda_base", "").is_err());
        assert!(validate_url("external.openfda_base", "invalid-url").is_err());
        assert!(validate_url("external.openfda_base", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_endpoint_template() {
        assert!(validate_endpoint_template(
            "sources.nih.endpoint",
            "https://clinicaltables.nlm.nih.gov/api/icd10cm/v3/search?sf=code,name&terms={term}"
        )
        .is_ok());
        assert!(validate_endpoint_template("sources.nih.endpoint", "https://example.com/search").is_err());
        assert!(validate_endpoint_template("sources.nih.endpoint", "not a url {term}").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("batch.batch_size", 25, 1).is_ok());
        assert!(validate_positive_number("batch.batch_size", 1, 1).is_ok());
        assert!(validate_positive_number("batch.batch_size", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("chains.icd10_live.cap", 10, 1, 50).is_ok());
        assert!(validate_range("chains.icd10_live.cap", 0, 1, 50).is_err());
        assert!(validate_range("chains.icd10_live.cap", 51, 1, 50).is_err());
    }

    #[test]
    fn test_required_term() {
        assert_eq!(
            required_term("terms", Some("  metformin "), "Search terms required").unwrap(),
            "metformin"
        );
        assert!(required_term("terms", Some("   "), "Search terms required").is_err());
        assert!(required_term("terms", None, "Search terms required").is_err());
    }
}
