use crate::domain::model::{CodeEntry, DrugFilter, DrugRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// One step of a source chain: a named layer that turns a term into zero or
/// more code entries. Implementations swallow their own failures.
#[async_trait]
pub trait LookupStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Remote strategies are the ones batch pacing applies to.
    fn is_remote(&self) -> bool {
        true
    }

    async fn lookup(&self, term: &str) -> Vec<CodeEntry>;
}

/// Read side of the drug storage layer.
#[async_trait]
pub trait DrugStore: Send + Sync {
    async fn find(&self, filter: &DrugFilter, limit: usize) -> Result<Vec<DrugRecord>>;
    async fn get(&self, id: &str) -> Result<Option<DrugRecord>>;
    async fn count(&self) -> usize;
}
