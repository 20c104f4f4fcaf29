//! Language server adapter
//!
//! Bridges tower-lsp events to the [`Orchestrator`](crate::orchestrator::Orchestrator)
//! and publishes what it returns.

pub mod convert;
pub mod server;

pub use server::Backend;
