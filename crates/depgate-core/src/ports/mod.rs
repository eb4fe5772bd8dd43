//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that core verification logic depends on.
//! Concrete implementations (adapters) live in `depgate-runtime` or are
//! supplied by the embedding application.
//!
//! # Design Rules
//!
//! - No process, HTTP or filesystem types in any signature
//! - Traits are `Send + Sync` so descriptors can be shared across tasks
//! - Resolvers return domain errors, never panics

mod resolver;
mod source;

pub use resolver::{DependencyResolver, ResolveRequest, ensure_found};
pub use source::{ConnectionInfo, NoopSourceProvider, SourceError, SourceProvider};

#[cfg(test)]
pub use source::MockSourceProvider;
