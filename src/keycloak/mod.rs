//! Keycloak Admin API client
//!
//! Every endpoint goes through the same pipeline: the resource path is
//! appended to the base URL given at construction one escaped segment at a
//! time (so a realm or id can never leave its resource), an `Authorization` header
//! is attached, the body is encoded as a form (token, introspection) or as
//! JSON (admin create/update calls), any status outside 2xx becomes
//! [`Error::RequestFailed`], and an empty body is read as `{}`.
//!
//! The `*_with` variants take a shaper closure that is applied to the decoded
//! representation before it is returned, e.g. to pull out a single field.

pub mod header;
pub mod types;

pub use header::{basic_credentials, normalize_bearer};
pub use types::*;

use crate::config::KeycloakConfig;
use crate::error::{Error, Result};
use crate::telemetry::metrics;
use reqwest::header::{AUTHORIZATION, LOCATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::convert::identity;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keycloak Admin API client.
///
/// Holds only the base URL and a connection pool, so it is cheap to clone
/// and safe to share between tasks.
#[derive(Clone)]
pub struct KeycloakClient {
    base_url: Url,
    http_client: Client,
}

impl KeycloakClient {
    /// `base_url` is the server root including the context path,
    /// e.g. `http://localhost:8080/auth`. A trailing `/` is ignored.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Self::with_http_client(base_url, http_client)
    }

    pub fn with_http_client(base_url: impl Into<String>, http_client: Client) -> Result<Self> {
        let raw = base_url.into();
        let mut base_url = Url::parse(&raw).map_err(|source| Error::InvalidBaseUrl {
            url: raw.clone(),
            source,
        })?;
        base_url
            .path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl {
                url: raw.clone(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty();

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn from_config(config: &KeycloakConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Self::with_http_client(config.service_url(), http_client)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Start a request to the base URL extended by `path`, one segment per
    /// element. `/` inside a segment is percent-encoded; empty and dot
    /// segments are rejected.
    fn call(&self, method: Method, path: &[&str]) -> Result<Call> {
        if let Some(segment) = path.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(Error::InvalidPathSegment {
                segment: segment.to_string(),
            });
        }

        let mut url = self.base_url.clone();
        // Cannot-be-a-base URLs are rejected at construction.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend(path);
        }

        Ok(Call {
            builder: self.http_client.request(method.clone(), url.clone()),
            method,
            url: url.into(),
        })
    }

    // ------------------------------------------------------------------
    // Realm OpenID Connect endpoints
    // ------------------------------------------------------------------

    /// Password grant against `/realms/{realm}/protocol/openid-connect/token`
    pub async fn get_token(&self, credentials: &Credentials) -> Result<TokenResponse> {
        self.get_token_with(credentials, identity).await
    }

    /// Like [`Self::get_token`], passing the token response through `shape`.
    pub async fn get_token_with<T>(
        &self,
        credentials: &Credentials,
        shape: impl FnOnce(TokenResponse) -> T,
    ) -> Result<T> {
        let path = [
            "realms",
            credentials.realm.as_str(),
            "protocol",
            "openid-connect",
            "token",
        ];
        let form = [
            ("grant_type", "password"),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("client_id", credentials.client_id.as_str()),
        ];

        let token: TokenResponse = self
            .call(Method::POST, &path)?
            .form(&form)
            .send()
            .await?
            .decode()?;

        Ok(shape(token))
    }

    /// Introspect `token` on behalf of a confidential client.
    ///
    /// `sub` in the result is the internal id of the token's user.
    pub async fn validate_token(
        &self,
        token: &str,
        realm: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<IntrospectionResult> {
        let path = [
            "realms",
            realm,
            "protocol",
            "openid-connect",
            "token",
            "introspect",
        ];

        self.call(Method::POST, &path)?
            .basic(client_id, client_secret)
            .form(&[("token", token)])
            .send()
            .await?
            .decode()
    }

    /// Profile claims of the user `access_token` was issued to.
    pub async fn get_user_info(
        &self,
        client_secret: &str,
        access_token: &str,
        realm: &str,
    ) -> Result<UserInfo> {
        self.get_user_info_with(client_secret, access_token, realm, identity)
            .await
    }

    pub async fn get_user_info_with<T>(
        &self,
        client_secret: &str,
        access_token: &str,
        realm: &str,
        shape: impl FnOnce(UserInfo) -> T,
    ) -> Result<T> {
        let path = ["realms", realm, "protocol", "openid-connect", "userinfo"];

        let info: UserInfo = self
            .call(Method::GET, &path)?
            .bearer(access_token)
            .query(&[("client_secret", client_secret)])
            .send()
            .await?
            .decode()?;

        Ok(shape(info))
    }

    /// Realm discovery document (`.well-known/openid-configuration`)
    pub async fn get_openid_configuration(&self, realm: &str) -> Result<OpenIdConfiguration> {
        let path = ["realms", realm, ".well-known", "openid-configuration"];

        self.call(Method::GET, &path)?.send().await?.decode()
    }

    // ------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------

    pub async fn create_client(
        &self,
        access_token: &str,
        realm: &str,
        client: &ClientRepresentation,
    ) -> Result<Created> {
        let reply = self
            .call(Method::POST, &["admin", "realms", realm, "clients"])?
            .bearer(access_token)
            .json(client)
            .send()
            .await?;

        Ok(reply.created())
    }

    /// Look up a client by its logical `client_id`.
    ///
    /// Returns `None` when Keycloak knows no such client. The returned
    /// representation carries the internal `id` the other client calls need.
    pub async fn get_client(
        &self,
        access_token: &str,
        realm: &str,
        client_id: &str,
    ) -> Result<Option<ClientRepresentation>> {
        self.get_client_with(access_token, realm, client_id, identity)
            .await
    }

    /// Like [`Self::get_client`]; `shape` runs only when a client was found.
    pub async fn get_client_with<T>(
        &self,
        access_token: &str,
        realm: &str,
        client_id: &str,
        shape: impl FnOnce(ClientRepresentation) -> T,
    ) -> Result<Option<T>> {
        let clients: Vec<ClientRepresentation> = self
            .call(Method::GET, &["admin", "realms", realm, "clients"])?
            .bearer(access_token)
            .query(&[("clientId", client_id)])
            .send()
            .await?
            .decode()?;

        Ok(clients.into_iter().next().map(shape))
    }

    /// Delete a client by internal id (not `client_id`).
    pub async fn delete_client(&self, access_token: &str, realm: &str, id: &str) -> Result<()> {
        self.call(Method::DELETE, &["admin", "realms", realm, "clients", id])?
            .bearer(access_token)
            .send()
            .await?;

        Ok(())
    }

    pub async fn get_client_secret(
        &self,
        access_token: &str,
        realm: &str,
        id: &str,
    ) -> Result<ClientSecret> {
        self.get_client_secret_with(access_token, realm, id, identity)
            .await
    }

    pub async fn get_client_secret_with<T>(
        &self,
        access_token: &str,
        realm: &str,
        id: &str,
        shape: impl FnOnce(ClientSecret) -> T,
    ) -> Result<T> {
        let path = ["admin", "realms", realm, "clients", id, "client-secret"];

        let secret: ClientSecret = self
            .call(Method::GET, &path)?
            .bearer(access_token)
            .send()
            .await?
            .decode()?;

        Ok(shape(secret))
    }

    // ------------------------------------------------------------------
    // Realm keys
    // ------------------------------------------------------------------

    pub async fn get_realm_keys(&self, access_token: &str, realm: &str) -> Result<RealmKeys> {
        self.get_realm_keys_with(access_token, realm, identity).await
    }

    /// Like [`Self::get_realm_keys`]; typical shapers pick one key, e.g.
    /// `|keys| keys.active_key("RSA").cloned()`.
    pub async fn get_realm_keys_with<T>(
        &self,
        access_token: &str,
        realm: &str,
        shape: impl FnOnce(RealmKeys) -> T,
    ) -> Result<T> {
        let keys: RealmKeys = self
            .call(Method::GET, &["admin", "realms", realm, "keys"])?
            .bearer(access_token)
            .send()
            .await?
            .decode()?;

        Ok(shape(keys))
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Create a user. The new user cannot log in until
    /// [`Self::reset_password`] has been called for it.
    pub async fn create_user(
        &self,
        access_token: &str,
        realm: &str,
        user: &UserRepresentation,
    ) -> Result<Created> {
        let reply = self
            .call(Method::POST, &["admin", "realms", realm, "users"])?
            .bearer(access_token)
            .json(user)
            .send()
            .await?;

        Ok(reply.created())
    }

    /// Look up a user by username.
    ///
    /// The search is sent with `exact=true`, so Keycloak does the matching
    /// (usernames are stored lowercased). `None` means no such user.
    pub async fn get_user(
        &self,
        access_token: &str,
        realm: &str,
        username: &str,
    ) -> Result<Option<UserRepresentation>> {
        self.get_user_with(access_token, realm, username, identity)
            .await
    }

    pub async fn get_user_with<T>(
        &self,
        access_token: &str,
        realm: &str,
        username: &str,
        shape: impl FnOnce(UserRepresentation) -> T,
    ) -> Result<Option<T>> {
        let users: Vec<UserRepresentation> = self
            .call(Method::GET, &["admin", "realms", realm, "users"])?
            .bearer(access_token)
            .query(&[("username", username), ("exact", "true")])
            .send()
            .await?
            .decode()?;

        Ok(users.into_iter().next().map(shape))
    }

    pub async fn list_users(
        &self,
        access_token: &str,
        realm: &str,
    ) -> Result<Vec<UserRepresentation>> {
        self.call(Method::GET, &["admin", "realms", realm, "users"])?
            .bearer(access_token)
            .send()
            .await?
            .decode()
    }

    /// Set a password credential on the user with internal id `user_id`.
    pub async fn reset_password(
        &self,
        access_token: &str,
        realm: &str,
        user_id: &str,
        new_password: &str,
        temporary: bool,
    ) -> Result<()> {
        let path = ["admin", "realms", realm, "users", user_id, "reset-password"];

        self.call(Method::PUT, &path)?
            .bearer(access_token)
            .json(&CredentialRepresentation::password(new_password, temporary))
            .send()
            .await?;

        Ok(())
    }

    /// Delete the user with internal id `user_id` (not the username).
    ///
    /// The id is available from [`Self::get_user`], or as `sub` from
    /// [`Self::validate_token`] / [`Self::get_user_info`].
    pub async fn delete_user(&self, access_token: &str, realm: &str, user_id: &str) -> Result<()> {
        self.call(Method::DELETE, &["admin", "realms", realm, "users", user_id])?
            .bearer(access_token)
            .send()
            .await?;

        Ok(())
    }
}

/// One outbound request being assembled
struct Call {
    method: Method,
    url: String,
    builder: RequestBuilder,
}

impl Call {
    fn bearer(mut self, access_token: &str) -> Self {
        self.builder = self
            .builder
            .header(AUTHORIZATION, normalize_bearer(access_token).into_owned());
        self
    }

    fn basic(mut self, client_id: &str, client_secret: &str) -> Self {
        self.builder = self
            .builder
            .header(AUTHORIZATION, basic_credentials(client_id, client_secret));
        self
    }

    fn query<T: Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }

    /// `application/x-www-form-urlencoded` body
    fn form<T: Serialize + ?Sized>(mut self, form: &T) -> Self {
        self.builder = self.builder.form(form);
        self
    }

    /// `application/json` body
    fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.builder = self.builder.json(body);
        self
    }

    async fn send(self) -> Result<Reply> {
        let Call {
            method,
            url,
            builder,
        } = self;

        debug!(method = %method, url = %url, "Sending Keycloak request");
        let started = Instant::now();

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_request(method.as_str(), None, started.elapsed());
                warn!(method = %method, url = %url, error = %e, "Keycloak request did not complete");
                return Err(Error::Transport(e));
            }
        };

        let status = response.status();
        metrics::record_request(method.as_str(), Some(status.as_u16()), started.elapsed());

        if !status.is_success() {
            warn!(method = %method, url = %url, status = status.as_u16(), "Keycloak request failed");
            return Err(Error::RequestFailed {
                status: status.as_u16(),
                method,
                url,
            });
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;
        let body = match parse_body(&bytes) {
            Ok(body) => body,
            Err(source) => return Err(Error::InvalidResponse { method, url, source }),
        };

        Ok(Reply {
            method,
            url,
            location,
            body,
        })
    }
}

/// A successful response
struct Reply {
    method: Method,
    url: String,
    location: Option<String>,
    body: Value,
}

impl Reply {
    fn decode<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.body).map_err(|source| Error::InvalidResponse {
            method: self.method,
            url: self.url,
            source,
        })
    }

    fn created(self) -> Created {
        Created {
            location: self.location,
        }
    }
}

/// Parse a response body; an empty body reads as `{}`.
pub(crate) fn parse_body(bytes: &[u8]) -> serde_json::Result<Value> {
    if bytes.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}
