//! # client
//!
//! Session/view state for the login shell served by `portal`.
//!
//! The controller in [`state::session`] owns every auth-related transition.
//! It talks to the remote auth backend through [`net::api::AuthApi`] and
//! mirrors the signed-in identity into a [`util::storage::PersistentStore`]
//! so a reload comes back signed in.

pub mod config;
pub mod net;
pub mod state;
pub mod util;
