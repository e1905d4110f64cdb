//! Networking modules for the remote auth backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles the REST calls and `types` defines the wire schema and the
//! error taxonomy surfaced to the session controller.

pub mod api;
pub mod types;
