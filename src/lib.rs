//! # tap-nationbuilder
//!
//! Singer tap extracting NationBuilder contacts.
//!
//! Modules:
//! - `config` — JSON config file, typed settings and the write-back store
//! - `auth` — OAuth2 refresh-token authenticator persisting rotated tokens
//! - `streams` — the `Contacts` stream and sample-based schema inference
//! - `singer` — Singer messages, catalog and state
//! - `tap` — wiring of config, authenticator and streams for one run

pub mod auth;
pub mod config;
pub mod helpers;
pub mod singer;
pub mod streams;
pub mod tap;
pub mod utils;
#[cfg(test)]
mod tests;


pub use crate::auth::NationBuilderAuthenticator;
pub use crate::config::store::{ConfigAccess, ConfigStore};
pub use crate::tap::Tap;
