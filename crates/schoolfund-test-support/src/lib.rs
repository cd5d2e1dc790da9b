//! Shared test doubles and utilities for the school event fund store.

mod logging;
mod repository;

pub use logging::init_tracing;
pub use repository::{
    FailingDocumentRepository, InMemoryDocumentRepository, ReadOnlyDocumentRepository,
};
