//! Utility helpers shared across client modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` isolates where the signed-in session is kept so the controller
//! does not care whether it is a file, a keychain or a map in a test.

pub mod storage;
