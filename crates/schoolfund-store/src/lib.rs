//! Schoolfund Store — file-system persistence for the event fund document.
//!
//! Implements the `DocumentRepository` seam from `schoolfund-core` on top of
//! a single JSON file under an installation data root.

pub mod config;
pub mod error;
pub mod json_file_repository;
