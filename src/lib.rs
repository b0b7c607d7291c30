//! Bitwarden App Extension
//!
//! The core of the Bitwarden app extension: it recognises what a host app is
//! asking for, checks the main app's login and lock state, and returns the
//! credentials the user chose in the shape the host expects.
//!
//! ## Features
//! - Ordered matching of host attachments (web page, find/fill/save login,
//!   change password, setup)
//! - Lock-type routing to unlock, login list, new login and setup screens
//! - Fill scripts generated from collected page details
//! - Shared app-group settings with the main app
//!
//! ## Architecture
//! - `extension` - attachments, dispatch, routing, completion, session
//! - `services` - per-invocation collaborators (auth, lock, analytics)
//! - `settings` - app-group key-value store
//! - `form_entry` - password-toggle entry and form cell state

pub mod config;
pub mod error;
pub mod extension;
pub mod form_entry;
pub mod services;
pub mod settings;

pub use error::{ExtensionError, Result};
