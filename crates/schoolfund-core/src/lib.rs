//! Schoolfund Core — shared domain abstractions.
//!
//! This crate defines the error taxonomy and the persistence seam that the
//! event participation store depends on. It contains no infrastructure code.

pub mod error;
pub mod repository;
