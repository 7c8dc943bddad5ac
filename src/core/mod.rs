pub mod enrichment;
pub mod mapping;
pub mod normalizer;
pub mod resolver;
pub mod safety;

pub use crate::domain::model::{CodeEntry, ResolutionResult};
pub use crate::domain::ports::{DrugStore, LookupStrategy};
pub use crate::utils::error::Result;
pub use resolver::{ChainOrder, SourceChain};
