//! Keycloak REST representations

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Resource-owner password credentials for the token endpoint
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub realm: String,
    pub client_id: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            realm: realm.into(),
            client_id: client_id.into(),
        }
    }
}

/// Token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_type: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default, rename = "not-before-policy")]
    pub not_before_policy: Option<i64>,
    #[serde(default)]
    pub session_state: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Keycloak client (OAuth application) representation.
///
/// `client_id` is the logical name; `id` is the internal UUID that the
/// per-client endpoints expect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_client: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_access_grants_enabled: Option<bool>,
    /// Any other attribute Keycloak accepts or returns (redirectUris, protocol, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientRepresentation {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub fn bearer_only(mut self, value: bool) -> Self {
        self.bearer_only = Some(value);
        self
    }

    pub fn public_client(mut self, value: bool) -> Self {
        self.public_client = Some(value);
        self
    }

    pub fn direct_access_grants_enabled(mut self, value: bool) -> Self {
        self.direct_access_grants_enabled = Some(value);
        self
    }
}

/// Client secret (a credential representation; the useful part is `value`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSecret {
    #[serde(default, rename = "type")]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRepresentation {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub value: String,
    pub temporary: bool,
}

impl CredentialRepresentation {
    pub fn password(value: impl Into<String>, temporary: bool) -> Self {
        Self {
            credential_type: "password".to_string(),
            value: value.into(),
            temporary,
        }
    }
}

/// Keycloak user representation.
///
/// Credentials sent on creation are not reliably applied by Keycloak; call
/// [`crate::KeycloakClient::reset_password`] before logging in as the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<CredentialRepresentation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Realm keys metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RealmKeys {
    /// Algorithm type -> kid of the active key
    #[serde(default)]
    pub active: HashMap<String, String>,
    #[serde(default)]
    pub keys: Vec<RealmKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmKey {
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub provider_priority: Option<i64>,
    pub kid: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

impl RealmKeys {
    /// The key `active` points at for this type (e.g. "RSA").
    pub fn active_key(&self, key_type: &str) -> Option<&RealmKey> {
        let kid = self.active.get(key_type)?;
        self.keys
            .iter()
            .find(|k| &k.kid == kid && k.key_type == key_type)
    }
}

/// Token introspection result.
///
/// `sub` is the internal user id when the token is active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntrospectionResult {
    pub active: bool,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default, rename = "typ")]
    pub token_type: Option<String>,
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// Userinfo endpoint claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

/// Realm OpenID Connect discovery document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub introspection_endpoint: Option<String>,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
    pub jwks_uri: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Result of a create call: Keycloak answers 201 with an empty body and a
/// `Location` header pointing at the new resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Created {
    pub location: Option<String>,
}

impl Created {
    /// Internal id of the created resource (last path segment of `Location`).
    pub fn id(&self) -> Option<&str> {
        self.location
            .as_deref()?
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }
}
