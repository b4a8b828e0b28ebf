pub mod config;
pub mod engine;
pub mod http;

pub use config::{SecretStore, SpaceCatalog};
pub use engine::{Engine, Outbox};
pub use http::{AppState, router};
