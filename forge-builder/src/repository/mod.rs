//! Repository layer
//!
//! Repositories abstract the builder's external collaborators: the
//! persistent store holding agent configuration and payload records, and
//! the event bus carrying notifications and error reports.
//!
//! All repositories are trait-based so the build service can be handed any
//! implementation at construction.

mod events;
mod store;

// Re-export traits
pub use events::EventBus;
pub use store::{PayloadStore, StoreError};

// Re-export implementations
pub use events::JsonLinesEventBus;
pub use store::{Catalog, CatalogStore};
