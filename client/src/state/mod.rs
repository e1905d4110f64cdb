//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! All auth-related UI state lives in one explicit controller struct with one
//! transition method per trigger.

pub mod session;
