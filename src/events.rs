use std::{fmt::Debug, sync::Arc};

use educe::Educe;
use futures::future::BoxFuture;
use typed_builder::TypedBuilder;
use url::Url;

use crate::{
    abort::RequestAborted,
    error::EventError,
    message::{ProtocolMessage, TokenEndpointRequest},
    oidc_discovery::ConfigurationManager,
};

/// Settings of an OpenID Connect client registered under one authentication scheme.
#[derive(Clone, TypedBuilder, Educe)]
#[educe(Debug)]
pub struct OidcClientOptions {
    #[builder(default, setter(strip_option))]
    pub authority: Option<Url>,

    #[builder(default, setter(into, strip_option))]
    pub client_id: Option<String>,

    #[builder(default, setter(into, strip_option))]
    #[educe(Debug(method(debug_secret)))]
    pub client_secret: Option<String>,

    /// Supplies the discovery document, used whenever an endpoint is not known up front.
    #[builder(default, setter(strip_option))]
    #[educe(Debug(ignore))]
    pub configuration_manager: Option<Arc<dyn ConfigurationManager>>,

    #[builder(default)]
    pub events: OidcEvents,
}

fn debug_secret(secret: &Option<String>, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match secret {
        Some(_) => f.write_str("Some(<redacted>)"),
        None => f.write_str("None"),
    }
}

/// Passed to redirect handlers right before the user agent is sent to the identity provider.
#[derive(Debug, Clone)]
pub struct RedirectContext {
    /// Name of the authentication scheme the redirect is performed for.
    pub scheme: String,
    /// The outgoing authorization request.
    pub protocol_message: ProtocolMessage,
}

impl RedirectContext {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            protocol_message: ProtocolMessage::new(),
        }
    }
}

/// Passed to handlers once an authorization code was received and is about to be redeemed.
#[derive(Debug, Clone)]
pub struct AuthorizationCodeReceivedContext {
    pub scheme: String,
    pub options: Arc<OidcClientOptions>,
    /// The authorization response carrying the code.
    pub protocol_message: ProtocolMessage,
    /// The pending request to the token endpoint. Handlers may alter it.
    pub token_endpoint_request: TokenEndpointRequest,
    pub request_aborted: RequestAborted,
}

impl AuthorizationCodeReceivedContext {
    pub fn new(scheme: impl Into<String>, options: Arc<OidcClientOptions>) -> Self {
        Self {
            scheme: scheme.into(),
            options,
            protocol_message: ProtocolMessage::new(),
            token_endpoint_request: TokenEndpointRequest::default(),
            request_aborted: RequestAborted::never(),
        }
    }
}

pub trait RedirectHandler: Send + Sync {
    fn on_redirect_to_identity_provider<'a>(
        &'a self,
        context: &'a mut RedirectContext,
    ) -> BoxFuture<'a, Result<(), EventError>>;
}

pub trait AuthorizationCodeReceivedHandler: Send + Sync {
    fn on_authorization_code_received<'a>(
        &'a self,
        context: &'a mut AuthorizationCodeReceivedContext,
    ) -> BoxFuture<'a, Result<(), EventError>>;
}

/// Adapts a synchronous closure into a `RedirectHandler`.
pub struct RedirectFn<F>(pub F);

impl<F> RedirectHandler for RedirectFn<F>
where
    F: Fn(&mut RedirectContext) -> Result<(), EventError> + Send + Sync,
{
    fn on_redirect_to_identity_provider<'a>(
        &'a self,
        context: &'a mut RedirectContext,
    ) -> BoxFuture<'a, Result<(), EventError>> {
        Box::pin(std::future::ready((self.0)(context)))
    }
}

/// Adapts a synchronous closure into an `AuthorizationCodeReceivedHandler`.
pub struct AuthorizationCodeReceivedFn<F>(pub F);

impl<F> AuthorizationCodeReceivedHandler for AuthorizationCodeReceivedFn<F>
where
    F: Fn(&mut AuthorizationCodeReceivedContext) -> Result<(), EventError> + Send + Sync,
{
    fn on_authorization_code_received<'a>(
        &'a self,
        context: &'a mut AuthorizationCodeReceivedContext,
    ) -> BoxFuture<'a, Result<(), EventError>> {
        Box::pin(std::future::ready((self.0)(context)))
    }
}

/// Ordered handler lists of an OpenID Connect client.
///
/// Handlers run in registration order. Registering a handler never replaces earlier ones, so
/// customizations compose. The first failing handler stops the sequence.
#[derive(Clone, Default)]
pub struct OidcEvents {
    redirect_to_identity_provider: Vec<Arc<dyn RedirectHandler>>,
    authorization_code_received: Vec<Arc<dyn AuthorizationCodeReceivedHandler>>,
}

impl Debug for OidcEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcEvents")
            .field("redirect_to_identity_provider", &self.redirect_to_identity_provider.len())
            .field("authorization_code_received", &self.authorization_code_received.len())
            .finish()
    }
}

impl OidcEvents {
    pub fn with_redirect_handler(mut self, handler: impl RedirectHandler + 'static) -> Self {
        self.push_redirect_handler(Arc::new(handler));
        self
    }

    pub fn with_authorization_code_received_handler(
        mut self,
        handler: impl AuthorizationCodeReceivedHandler + 'static,
    ) -> Self {
        self.push_authorization_code_received_handler(Arc::new(handler));
        self
    }

    pub fn push_redirect_handler(&mut self, handler: Arc<dyn RedirectHandler>) {
        self.redirect_to_identity_provider.push(handler);
    }

    pub fn push_authorization_code_received_handler(
        &mut self,
        handler: Arc<dyn AuthorizationCodeReceivedHandler>,
    ) {
        self.authorization_code_received.push(handler);
    }

    pub fn num_redirect_handlers(&self) -> usize {
        self.redirect_to_identity_provider.len()
    }

    pub fn num_authorization_code_received_handlers(&self) -> usize {
        self.authorization_code_received.len()
    }

    pub async fn redirect_to_identity_provider(
        &self,
        context: &mut RedirectContext,
    ) -> Result<(), EventError> {
        for handler in &self.redirect_to_identity_provider {
            handler.on_redirect_to_identity_provider(context).await?;
        }
        Ok(())
    }

    pub async fn authorization_code_received(
        &self,
        context: &mut AuthorizationCodeReceivedContext,
    ) -> Result<(), EventError> {
        for handler in &self.authorization_code_received {
            handler.on_authorization_code_received(context).await?;
        }
        Ok(())
    }
}
