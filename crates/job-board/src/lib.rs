//! Job board application pipeline.
//!
//! Companies move candidate applications through a forward-only hiring pipeline; every accepted
//! move is persisted alongside an immutable audit record and the candidate is notified on a
//! best-effort basis once the change is durable.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
