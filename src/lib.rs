//! kcutils - Keycloak REST utilities
//!
//! This crate provides a typed client for the Keycloak Admin REST API and the
//! realm OpenID Connect endpoints (token, introspection, userinfo), together
//! with the configuration and telemetry plumbing used by the `kcutils` CLI.

pub mod config;
pub mod error;
pub mod keycloak;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use keycloak::KeycloakClient;
