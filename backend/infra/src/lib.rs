//! Infrastructure shared by the Google adapters and the oracle client.
//!
//! Provides access-token sources for Google APIs and the shared HTTP client.

pub mod google_auth;
pub mod http;

pub use google_auth::{
    GcloudCliToken, MetadataServerToken, StaticToken, TokenProvider, GOOGLE_API_SCOPES,
};
pub use http::build_http_client;
