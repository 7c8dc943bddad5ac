use crate::core::resolver::SourceChain;
use crate::domain::model::{CodeEntry, DrugRecord};
use crate::utils::error::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

const PROGRESS_EVERY: usize = 100;

struct NamePatterns {
    whitespace: Regex,
    manufacturer_prefix: Regex,
    form_suffix: Regex,
    unit_suffix: Regex,
    strength_suffix: Regex,
}

fn name_patterns() -> &'static NamePatterns {
    static PATTERNS: OnceLock<NamePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| NamePatterns {
        whitespace: Regex::new(r"\s+").expect("valid pattern"),
        manufacturer_prefix: Regex::new(
            r"^(teva|pfizer|novartis|roche|merck|gsk|abbott|bayer|sanofi|astrazeneca)-?",
        )
        .expect("valid pattern"),
        form_suffix: Regex::new(
            r"-(tablets?|capsules?|injection|syrup|suspension|solution|cream|ointment|gel|drops?|spray|inhaler|patch|suppository|powder|granules|sachets?|vials?|ampoules?|prefilled|pen|auto-injector|extended|release|controlled|immediate|delayed|enteric|coated|chewable|dispersible|effervescent|sublingual|buccal|transdermal|topical|ophthalmic|otic|nasal|rectal|vaginal|oral|intravenous|intramuscular|subcutaneous)$",
        )
        .expect("valid pattern"),
        unit_suffix: Regex::new(r"\s+(mg|mcg|g|ml|l|units?|iu|%|\d+)\s*$").expect("valid pattern"),
        strength_suffix: Regex::new(r"\s*\d+\s*(mg|mcg|g|ml|l|units?|iu|%)\s*$")
            .expect("valid pattern"),
    })
}

/// Best guess at the generic ingredient in a registry package name: the
/// first word left after stripping manufacturer prefixes, dosage form
/// suffixes and trailing strengths.
pub fn extract_generic_name(drug_name: &str) -> String {
    let p = name_patterns();

    let lowered = drug_name.to_lowercase();
    let cleaned = p.whitespace.replace_all(&lowered, " ");
    let cleaned = cleaned.trim();
    let cleaned = p.manufacturer_prefix.replace(cleaned, "");
    let cleaned = p.form_suffix.replace(&cleaned, "");
    let cleaned = p.unit_suffix.replace(&cleaned, "");
    let cleaned = p.strength_suffix.replace(&cleaned, "");

    match cleaned.split_whitespace().next() {
        Some(word) => word.to_string(),
        None => drug_name.to_string(),
    }
}

/// Terms tried for one drug, most specific first.
pub fn search_terms(drug_name: &str) -> Vec<String> {
    let generic = extract_generic_name(drug_name);
    let mut terms = Vec::with_capacity(2);
    for term in [generic.trim(), drug_name.trim()] {
        let term = term.to_string();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentStats {
    pub processed: usize,
    pub with_codes: usize,
    pub without_codes: usize,
}

impl EnrichmentStats {
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.with_codes as f64 * 100.0 / self.processed as f64
        }
    }
}

pub type EnrichmentOutput = BTreeMap<String, Vec<CodeEntry>>;

pub struct EnrichmentRunner {
    chain: SourceChain,
    batch_size: usize,
    batch_delay: Duration,
    output_path: PathBuf,
}

impl EnrichmentRunner {
    pub fn new(
        chain: SourceChain,
        batch_size: usize,
        batch_delay: Duration,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            chain,
            batch_size: batch_size.max(1),
            batch_delay,
            output_path: output_path.into(),
        }
    }

    /// Resolves codes for one drug name, trying each search term in turn.
    pub async fn enrich_one(&self, drug_name: &str) -> Vec<CodeEntry> {
        for term in search_terms(drug_name) {
            let result = self.chain.resolve(&term).await;
            if !result.is_empty() {
                return result.entries;
            }
        }
        Vec::new()
    }

    /// Processes the drugs in batches, saving the partial map after each
    /// batch and pausing between batches.
    pub async fn run(&self, drugs: &[DrugRecord]) -> Result<(EnrichmentOutput, EnrichmentStats)> {
        let names: Vec<&str> = drugs
            .iter()
            .map(|d| {
                let package = d.package_name.trim();
                if package.is_empty() {
                    d.generic_name.trim()
                } else {
                    package
                }
            })
            .filter(|name| !name.is_empty())
            .collect();

        let total = names.len();
        let batch_count = total.div_ceil(self.batch_size);
        let mut output = EnrichmentOutput::new();
        let mut stats = EnrichmentStats::default();

        tracing::info!(total, batch_size = self.batch_size, "starting enrichment");

        for (batch_index, batch) in names.chunks(self.batch_size).enumerate() {
            tracing::info!("batch {}/{}", batch_index + 1, batch_count);

            for name in batch {
                let codes = self.enrich_one(name).await;
                stats.processed += 1;

                if codes.is_empty() {
                    stats.without_codes += 1;
                    tracing::debug!(drug = %name, "no codes found");
                } else {
                    stats.with_codes += 1;
                    tracing::debug!(drug = %name, count = codes.len(), "codes found");
                    output.insert(name.to_string(), codes);
                }

                if stats.processed % PROGRESS_EVERY == 0 {
                    tracing::info!(
                        "progress: {}/{} ({} with codes)",
                        stats.processed,
                        total,
                        stats.with_codes
                    );
                }
            }

            self.save(&output)?;

            if batch_index + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        tracing::info!(
            processed = stats.processed,
            with_codes = stats.with_codes,
            without_codes = stats.without_codes,
            "enrichment complete ({:.1}% with codes)",
            stats.success_rate()
        );

        Ok((output, stats))
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn save(&self, output: &EnrichmentOutput) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.output_path, serde_json::to_string_pretty(output)?)?;
        tracing::debug!("saved {} entries to {}", output.len(), self.output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::LocalMappingTable;
    use crate::core::resolver::ChainOrder;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_extract_generic_name() {
        assert_eq!(extract_generic_name("Metformin 500 mg"), "metformin");
        assert_eq!(extract_generic_name("TEVA-AMLODIPINE"), "amlodipine");
        assert_eq!(extract_generic_name("omeprazole-capsules"), "omeprazole");
        assert_eq!(extract_generic_name("GLUCOPHAGE   XR 1000MG"), "glucophage");
        assert_eq!(extract_generic_name(""), "");
    }

    #[test]
    fn test_search_terms_order_and_dedupe() {
        assert_eq!(
            search_terms("Lipitor 20mg"),
            vec!["lipitor".to_string(), "Lipitor 20mg".to_string()]
        );
        assert_eq!(search_terms("aspirin"), vec!["aspirin".to_string()]);
        assert!(search_terms("   ").is_empty());
    }

    fn local_chain() -> SourceChain {
        SourceChain::assemble(
            "batch",
            ChainOrder::LocalFirst,
            Arc::new(LocalMappingTable::common()),
            Vec::new(),
            3,
            None,
        )
    }

    fn record(package: &str, generic: &str) -> DrugRecord {
        DrugRecord {
            package_name: package.to_string(),
            generic_name: generic.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_writes_output_and_stats() {
        let dir = TempDir::new().unwrap();
        let output_path = dir.path().join("out/icd10-enriched.json");

        let runner = EnrichmentRunner::new(local_chain(), 2, Duration::ZERO, &output_path);
        let drugs = vec![
            record("GLUCOPHAGE METFORMIN 500MG", "Metformin"),
            record("", "Warfarin Sodium"),
            record("MYSTERYCILLIN", ""),
            record("", ""),
        ];

        let (output, stats) = runner.run(&drugs).await.unwrap();

        assert_eq!(
            stats,
            EnrichmentStats {
                processed: 3,
                with_codes: 2,
                without_codes: 1
            }
        );
        assert_eq!(output["GLUCOPHAGE METFORMIN 500MG"][0].code, "E11.9");
        assert_eq!(output["Warfarin Sodium"][0].code, "I48.91");

        let saved: EnrichmentOutput =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(saved, output);
    }

    #[test]
    fn test_success_rate() {
        let stats = EnrichmentStats {
            processed: 4,
            with_codes: 1,
            without_codes: 3,
        };
        assert_eq!(stats.success_rate(), 25.0);
        assert_eq!(EnrichmentStats::default().success_rate(), 0.0);
    }
}
