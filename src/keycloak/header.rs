//! Authorization header values

use base64::Engine;
use std::borrow::Cow;

const BEARER_PREFIX: &str = "Bearer ";

/// Prefix `Bearer ` unless the value already carries a (case-insensitive)
/// `bearer ` scheme, in which case it is returned untouched.
pub fn normalize_bearer(value: &str) -> Cow<'_, str> {
    let has_scheme = value
        .get(..BEARER_PREFIX.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(BEARER_PREFIX));

    if has_scheme {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(format!("{}{}", BEARER_PREFIX, value))
    }
}

/// `Basic base64(client_id:client_secret)` as used by the introspection endpoint.
pub fn basic_credentials(client_id: &str, client_secret: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD
        .encode(format!("{}:{}", client_id, client_secret));
    format!("Basic {}", encoded)
}
