use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The parts of an OpenID Provider's discovery document this crate cares about.
///
/// See: `https://openid.net/specs/openid-connect-discovery-1_0.html#ProviderMetadata`
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// REQUIRED. URL the OP asserts as its Issuer Identifier.
    pub issuer: String,

    /// REQUIRED. URL of the OP's OAuth 2.0 Authorization Endpoint.
    pub authorization_endpoint: String,

    /// URL of the OP's OAuth 2.0 Token Endpoint.
    /// This is REQUIRED unless only the Implicit Flow is used.
    pub token_endpoint: Option<String>,

    pub userinfo_endpoint: Option<String>,

    pub jwks_uri: Option<String>,

    pub end_session_endpoint: Option<String>,

    /// Whether the OP supports the `claims` parameter. If omitted, the default value is false.
    pub claims_parameter_supported: Option<bool>,

    /// Claim names the OP may be able to supply values for.
    pub claims_supported: Option<Vec<String>>,

    /// Client authentication methods supported by the token endpoint,
    /// e.g. `client_secret_post` or `client_secret_jwt`.
    /// If omitted, the default is `client_secret_basic`.
    pub token_endpoint_auth_methods_supported: Option<Vec<String>>,

    /// JWS algorithms supported for `private_key_jwt` and `client_secret_jwt` assertions.
    pub token_endpoint_auth_signing_alg_values_supported: Option<Vec<String>>,

    /// Contains all the additional fields not otherwise parsable.
    #[serde(flatten)]
    pub additional_claims: HashMap<String, serde_json::Value>,
}

impl DiscoveryDocument {
    /// Whether the OP announced support for the given token endpoint authentication method.
    /// Providers not announcing any method only support `client_secret_basic`.
    pub fn supports_token_endpoint_auth_method(&self, method: &str) -> bool {
        match &self.token_endpoint_auth_methods_supported {
            Some(methods) => methods.iter().any(|it| it == method),
            None => method == "client_secret_basic",
        }
    }
}
