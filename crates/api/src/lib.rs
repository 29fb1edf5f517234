//! Deckstash API server library.
//!
//! Exposes config, state, error handling, importers, and routes so
//! integration tests and the binary entrypoint share one router.

pub mod config;
pub mod error;
pub mod handlers;
pub mod importers;
pub mod routes;
pub mod state;
