//! Constraint-enforcing generation of shortened broadcast billing copy.
//!
//! `contexts` holds the pipeline (prompt assembly, backend call, response
//! parsing, length repair, orchestration), `data` the plain types it passes
//! around and `registries` the file- and environment-backed collaborators.

pub mod contexts;
pub mod data;
pub mod registries;
