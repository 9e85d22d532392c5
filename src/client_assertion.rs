use std::sync::Arc;

use futures::future::BoxFuture;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;
use snafu::{OptionExt, ResultExt};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{
    case_insensitive::eq_ignore_case,
    clock::{Clock, SystemClock},
    error::{
        EncodeAssertionSnafu, EventError, MissingClientIdSnafu, MissingClientSecretSnafu,
        MissingConfigurationManagerSnafu, MissingTokenEndpointSnafu,
    },
    events::{AuthorizationCodeReceivedContext, AuthorizationCodeReceivedHandler},
    message::CLIENT_ASSERTION_TYPE_JWT_BEARER,
};

/// Token endpoint authentication method name, as announced in discovery documents.
pub const CLIENT_SECRET_JWT: &str = "client_secret_jwt";

/// Lifetime of an issued client assertion.
pub const ASSERTION_LIFETIME: Duration = Duration::minutes(1);

/// A claim placed into the client assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    pub name: String,
    pub value: Value,
}

impl Claim {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAssertion {
    pub assertion_type: String,
    pub value: String,
}

/// Authenticates the client at the token endpoint using `client_secret_jwt`:
/// a JWT signed with HS256 using the client secret, instead of sending the secret itself.
#[derive(Clone)]
pub struct ClientSecretJwtEvents {
    clock: Arc<dyn Clock>,
    claims: Vec<Claim>,
}

impl Default for ClientSecretJwtEvents {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl ClientSecretJwtEvents {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            claims: Vec::new(),
        }
    }

    /// Adds a claim to every assertion.
    ///
    /// A claim named `iat`, `jti` or `sub` (compared ignoring case) replaces the generated
    /// one. Claims named exactly `iss`, `aud`, `nbf` or `exp` are always overwritten with the
    /// client id, the token endpoint and the validity window.
    pub fn with_claim(mut self, claim: Claim) -> Self {
        self.claims.push(claim);
        self
    }

    pub async fn create_client_assertion(
        &self,
        context: &AuthorizationCodeReceivedContext,
    ) -> Result<ClientAssertion, EventError> {
        // Empty values count as missing.
        let client_id = context
            .options
            .client_id
            .as_deref()
            .filter(|it| !it.is_empty())
            .context(MissingClientIdSnafu {})?;
        let client_secret = context
            .options
            .client_secret
            .as_deref()
            .filter(|it| !it.is_empty())
            .context(MissingClientSecretSnafu {})?;

        let now = self.clock.now();

        let audience = match &context.token_endpoint_request.token_endpoint {
            Some(token_endpoint) => token_endpoint.clone(),
            None => discover_token_endpoint(context).await?,
        };

        let key = EncodingKey::from_secret(client_secret.as_bytes());

        let mut claims = self.claims.clone();
        ensure_required_claims(&mut claims, now, client_id);

        let mut payload = serde_json::Map::with_capacity(claims.len() + 4);
        for claim in claims {
            payload.insert(claim.name, claim.value);
        }
        payload.insert(String::from("iss"), Value::from(client_id));
        payload.insert(String::from("aud"), Value::from(audience));
        payload.insert(String::from("nbf"), Value::from(now.unix_timestamp()));
        payload.insert(
            String::from("exp"),
            Value::from((now + ASSERTION_LIFETIME).unix_timestamp()),
        );

        let value = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &payload, &key)
            .map_err(Arc::new)
            .context(EncodeAssertionSnafu {})?;

        Ok(ClientAssertion {
            assertion_type: String::from(CLIENT_ASSERTION_TYPE_JWT_BEARER),
            value,
        })
    }

    /// Replaces the client credentials of the pending token request with a client assertion.
    #[tracing::instrument(level = "debug", skip_all, fields(scheme = %context.scheme))]
    pub async fn authorization_code_received(
        &self,
        context: &mut AuthorizationCodeReceivedContext,
    ) -> Result<(), EventError> {
        let client_assertion = self.create_client_assertion(context).await?;

        let message = &mut context.token_endpoint_request.message;
        message.set_client_assertion(Some(client_assertion.value));
        message.set_client_assertion_type(Some(client_assertion.assertion_type));
        message.set_client_id(None);
        message.set_client_secret(None);

        debug!("Client assertion added to the token endpoint request.");
        Ok(())
    }
}

impl AuthorizationCodeReceivedHandler for ClientSecretJwtEvents {
    fn on_authorization_code_received<'a>(
        &'a self,
        context: &'a mut AuthorizationCodeReceivedContext,
    ) -> BoxFuture<'a, Result<(), EventError>> {
        Box::pin(self.authorization_code_received(context))
    }
}

async fn discover_token_endpoint(
    context: &AuthorizationCodeReceivedContext,
) -> Result<String, EventError> {
    let configuration_manager = context
        .options
        .configuration_manager
        .as_ref()
        .context(MissingConfigurationManagerSnafu {})?;

    let document = configuration_manager
        .get_configuration(&context.request_aborted)
        .await?;

    if !document.supports_token_endpoint_auth_method(CLIENT_SECRET_JWT) {
        warn!(
            issuer = %document.issuer,
            "The identity provider does not announce support for client_secret_jwt."
        );
    }

    document.token_endpoint.context(MissingTokenEndpointSnafu {
        issuer: document.issuer.clone(),
    })
}

/// Adds `iat`, `jti` and `sub`, each only if no claim of that name (ignoring case) is present.
fn ensure_required_claims(claims: &mut Vec<Claim>, now: OffsetDateTime, client_id: &str) {
    let mut add_missing = |name: &str, value: Value| {
        if !claims.iter().any(|claim| eq_ignore_case(&claim.name, name)) {
            claims.push(Claim::new(name, value));
        }
    };

    add_missing("iat", Value::from(now.unix_timestamp()));
    add_missing("jti", Value::from(uuid::Uuid::new_v4().to_string()));
    add_missing("sub", Value::from(client_id));
}
