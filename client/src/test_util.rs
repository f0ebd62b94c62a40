//! Helpers for fabricating access tokens in tests.
//!
//! The decoder never verifies signatures, so tokens signed with this
//! throwaway secret decode exactly like production ones.

use jsonwebtoken::{encode, EncodingKey, Header};

use crate::auth::claims::AccessClaims;

const TEST_SECRET: &[u8] = b"dormlink-test-secret";

/// Minimal access token carrying only the required claims.
pub fn access_token(user_id: i64, exp: u64) -> String {
    let claims = AccessClaims {
        user_id,
        exp,
        username: None,
        first_name: None,
        last_name: None,
        email: None,
        phone: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("Failed to encode JWT")
}

/// Access token with embedded profile fragments.
pub fn access_token_with_profile(
    user_id: i64,
    username: &str,
    first_name: &str,
    last_name: &str,
) -> String {
    let claims = AccessClaims {
        user_id,
        exp: 2_000_000_000,
        username: Some(username.to_string()),
        first_name: Some(first_name.to_string()),
        last_name: Some(last_name.to_string()),
        email: Some(format!("{}@example.com", username)),
        phone: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("Failed to encode JWT")
}

/// Structurally valid JWT with an arbitrary payload, for malformed-claims
/// cases.
pub fn raw_token(claims: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET),
    )
    .expect("Failed to encode JWT")
}
