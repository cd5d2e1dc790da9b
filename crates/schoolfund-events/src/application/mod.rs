//! Application layer: the record store and its command and query handlers.

pub mod command_handlers;
pub mod query_handlers;
pub mod store;
