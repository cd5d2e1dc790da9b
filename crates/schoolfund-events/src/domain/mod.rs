//! Domain model: the document aggregate and the rules that keep it
//! consistent.

pub mod aggregates;
pub mod allocation;
pub mod commands;
pub mod ids;
pub mod migration;
pub mod money;
pub mod roster;
pub mod seed;
