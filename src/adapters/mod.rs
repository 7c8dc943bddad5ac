// Concrete implementations for external systems: remote lookup sources,
// pharma APIs and the file-backed datasets.

pub mod pharma;
pub mod remote;
pub mod storage;

pub use remote::{RemoteSource, SourceCatalog};
pub use storage::{Formulary, Icd10Catalog, LoadStatus, RegistryStore};
