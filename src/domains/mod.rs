//! Domains module containing business logic organized by bounded contexts.
//!
//! The server exposes tools only; each tool lives under `tools/definitions`.

pub mod tools;
