//! Configuration management for kcutils

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Keycloak server location
    pub keycloak: KeycloakConfig,
    /// Account used to obtain an admin token
    pub initial_account: InitialAccountConfig,
    /// Telemetry configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct KeycloakConfig {
    /// "http" or "https"
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Full base URL (e.g., https://sso.example.com/auth); wins over protocol/host/port
    pub url_override: Option<String>,
    pub request_timeout_secs: u64,
}

impl KeycloakConfig {
    /// Base URL every REST path is appended to.
    pub fn service_url(&self) -> String {
        match &self.url_override {
            Some(url) => url.clone(),
            None => format!("{}://{}:{}/auth", self.protocol, self.host, self.port),
        }
    }
}

/// Bootstrap credentials, normally an admin in the master realm
#[derive(Debug, Clone)]
pub struct InitialAccountConfig {
    pub username: String,
    pub password: String,
    pub realm: String,
    pub client_id: String,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "text" or "json"
    pub log_format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            keycloak: KeycloakConfig {
                protocol: env::var("KEYCLOAK_SERVICE_PROTOCOL")
                    .unwrap_or_else(|_| "http".to_string()),
                host: env::var("KEYCLOAK_SERVICE_HOST")
                    .unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("KEYCLOAK_SERVICE_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .context("Invalid KEYCLOAK_SERVICE_PORT")?,
                url_override: env::var("KEYCLOAK_SERVICE_URL")
                    .ok()
                    .filter(|v| !v.is_empty()),
                request_timeout_secs: env::var("KEYCLOAK_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid KEYCLOAK_REQUEST_TIMEOUT_SECS")?,
            },
            initial_account: InitialAccountConfig {
                username: env::var("KC_INITIAL_USERNAME").unwrap_or_else(|_| "foo".to_string()),
                password: env::var("KC_INITIAL_PASSWORD").unwrap_or_else(|_| "bar".to_string()),
                realm: env::var("KC_INITIAL_REALM").unwrap_or_else(|_| "master".to_string()),
                client_id: env::var("KC_INITIAL_CLIENT")
                    .unwrap_or_else(|_| "admin-cli".to_string()),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("KCUTILS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            },
        })
    }
}
