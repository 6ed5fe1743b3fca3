//! Domain types and pure logic for the polyadmin console engines.
//!
//! Nothing in this crate performs I/O. It holds the wire models exchanged
//! with the DBMS backend, the adapter deployment form reconciler, unique
//! name allocation and validation, and cache-status interpretation.

pub mod adapter;
pub mod cache_status;
pub mod deploy;
pub mod error;
pub mod naming;
pub mod result_set;
pub mod settings;
pub mod table;
pub mod types;
pub mod validation;
