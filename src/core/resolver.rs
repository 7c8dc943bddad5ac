use crate::core::mapping::{LocalMappingTable, LocalStrategy};
use crate::domain::model::{CodeEntry, ResolutionResult};
use crate::domain::ports::LookupStrategy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Where the local mapping table sits in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainOrder {
    LocalFirst,
    RemoteFirst,
    RemoteOnly,
}

/// An ordered list of lookup strategies resolved first-success.
#[derive(Clone)]
pub struct SourceChain {
    name: String,
    strategies: Vec<Arc<dyn LookupStrategy>>,
    cap: usize,
    pacing: Option<Duration>,
}

impl SourceChain {
    pub fn new(
        name: impl Into<String>,
        strategies: Vec<Arc<dyn LookupStrategy>>,
        cap: usize,
        pacing: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            strategies,
            cap,
            pacing,
        }
    }

    /// Places the local table according to `order` around the remote
    /// strategies, which keep their given priority.
    pub fn assemble(
        name: impl Into<String>,
        order: ChainOrder,
        local: Arc<LocalMappingTable>,
        remotes: Vec<Arc<dyn LookupStrategy>>,
        cap: usize,
        pacing: Option<Duration>,
    ) -> Self {
        let mut strategies: Vec<Arc<dyn LookupStrategy>> = Vec::with_capacity(remotes.len() + 1);
        match order {
            ChainOrder::LocalFirst => {
                strategies.push(Arc::new(LocalStrategy::leading(local)));
                strategies.extend(remotes);
            }
            ChainOrder::RemoteFirst => {
                strategies.extend(remotes);
                strategies.push(Arc::new(LocalStrategy::trailing(local)));
            }
            ChainOrder::RemoteOnly => strategies.extend(remotes),
        }
        Self::new(name, strategies, cap, pacing)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, term: &str) -> ResolutionResult {
        let result = first_success(&self.strategies, term, self.cap, self.pacing).await;
        tracing::info!(
            chain = %self.name,
            term = %term,
            source = %result.source,
            count = result.entries.len(),
            "chain resolved"
        );
        result
    }
}

/// Tries each strategy in order and returns the first non-empty answer,
/// de-duplicated and truncated to `cap`. Pacing applies after an empty
/// remote answer when another strategy follows.
pub async fn first_success(
    strategies: &[Arc<dyn LookupStrategy>],
    term: &str,
    cap: usize,
    pacing: Option<Duration>,
) -> ResolutionResult {
    for (index, strategy) in strategies.iter().enumerate() {
        tracing::debug!(strategy = %strategy.name(), term = %term, "trying strategy");

        let entries = dedupe(strategy.lookup(term).await);
        if !entries.is_empty() {
            return ResolutionResult {
                entries: entries.into_iter().take(cap).collect(),
                source: strategy.name().to_string(),
            };
        }

        let has_next = index + 1 < strategies.len();
        if let Some(delay) = pacing {
            if strategy.is_remote() && has_next {
                tokio::time::sleep(delay).await;
            }
        }
    }

    ResolutionResult::none()
}

fn dedupe(entries: Vec<CodeEntry>) -> Vec<CodeEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}
