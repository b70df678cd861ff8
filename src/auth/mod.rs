//! OAuth2 refresh-token authentication for the NationBuilder API.

pub mod oauth2;
pub mod token_context;

pub use oauth2::{NationBuilderAuthenticator, OAuthRequestBody};
