//! Service layer
//!
//! Services contain the builder's business logic. The build service
//! orchestrates one payload build using the store, the event bus and the
//! smaller services below it.
//!
//! Services at the process and network seams are trait-based so tests can
//! substitute them.

mod build;
mod command;
mod locks;
mod publisher;
mod reporter;

// Re-export traits
pub use command::CommandRunner;
pub use publisher::ArtifactPublisher;

// Re-export implementations
pub use build::BuildService;
pub use command::ShellCommandRunner;
pub use publisher::ApiArtifactPublisher;

pub use command::{CommandError, CommandOutput};
pub use publisher::{PublishError, PublishedArtifact};
