mod error;
mod loader;
mod pass_catalog;
mod types;

pub use error::CatalogError;
pub use loader::{from_json_values, CatalogLoader, LoadedCatalog, RejectedRecord};
pub use pass_catalog::PassCatalog;
pub use types::{Pass, PassId, PassRecord, PassStatus};
