mod catalog;
mod secrets;

pub use catalog::{CatalogError, CatalogListing, SpaceCatalog, SpaceEntry, SpaceListing};
pub use secrets::{SecretStore, SecretStoreError};
