//! # oidc-claims-request
//!
//! Attach configured OpenID Connect claims requests to authorization redirects
//! and authenticate token requests using `client_secret_jwt`.
//!
//! ## Claims requests
//!
//! A claims request (OpenID Connect Core 1.0, section 5.5) asks the identity provider
//! for specific claims in the ID token and/or at the userinfo endpoint.
//! This library lets you configure one claims request per authentication scheme and attaches
//! it as the `claims` parameter whenever the user agent is redirected to the identity provider.
//!
//! The configuration usually lives in a settings file:
//!
//! ```yaml
//! Authentication:
//!   OpenIdConnect:
//!     ClaimsRequest:
//!       mappings:
//!         - authenticationScheme: county
//!           claimsRequest:
//!             idToken:
//!               - key: acr
//!                 essential: true
//!               - key: email
//!             userInfo:
//!               - key: given_name
//! ```
//!
//! Redirects for the scheme `county` then carry
//! `claims={"id_token":{"acr":{"essential":true},"email":null},"userinfo":{"given_name":null}}`.
//! Scheme names are matched ignoring case. Schemes without (or with an empty) claims request
//! are left untouched.
//!
//! ## client_secret_jwt
//!
//! `ClientSecretJwtEvents` replaces `client_id`/`client_secret` on the token request with a
//! short-lived JWT signed with the client secret (RFC 7523). The token endpoint is taken from the
//! token request or, if unknown, from the identity provider's discovery document.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use oidc_claims_request::{
//!     client_secret_jwt_events,
//!     clock::SystemClock,
//!     events::{AuthorizationCodeReceivedContext, OidcClientOptions, RedirectContext},
//!     oidc_discovery::HttpConfigurationManager,
//!     settings::{DEFAULT_SECTION_PATH, ReloadableClaimsRequestMap},
//! };
//! use url::Url;
//!
//! let claims_requests = Arc::new(ReloadableClaimsRequestMap::from_file(
//!     "appsettings.yaml",
//!     DEFAULT_SECTION_PATH,
//! )?);
//! let authority = Url::parse("https://idp.example/realms/county")?;
//!
//! let options = Arc::new(
//!     OidcClientOptions::builder()
//!         .configuration_manager(Arc::new(HttpConfigurationManager::from_authority(&authority)?))
//!         .authority(authority)
//!         .client_id("my-client")
//!         .client_secret("my-client-secret-of-at-least-16-bytes")
//!         .events(client_secret_jwt_events(claims_requests.clone(), Arc::new(SystemClock)))
//!         .build(),
//! );
//!
//! // Before redirecting to the identity provider.
//! let mut redirect = RedirectContext::new("county");
//! options.events.redirect_to_identity_provider(&mut redirect).await?;
//!
//! // After the identity provider returned an authorization code.
//! let mut code_received = AuthorizationCodeReceivedContext::new("county", options.clone());
//! options.events.authorization_code_received(&mut code_received).await?;
//!
//! // Whenever the settings file changed.
//! claims_requests.reload_from_file("appsettings.yaml", DEFAULT_SECTION_PATH)?;
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]

use std::sync::Arc;

pub mod abort;
pub mod case_insensitive;
pub mod claims_events;
pub mod claims_request;
pub mod client_assertion;
pub mod clock;
pub mod error;
pub mod events;
pub mod message;
pub mod oidc;
pub mod oidc_discovery;
pub mod options;
pub mod resolver;
pub mod settings;

/// Events attaching the claims request of the redirect's scheme and authenticating token requests
/// with `client_secret_jwt`.
pub fn client_secret_jwt_events(
    source: Arc<dyn settings::ClaimsRequestMapSource>,
    clock: Arc<dyn clock::Clock>,
) -> events::OidcEvents {
    events::OidcEvents::default()
        .with_redirect_handler(claims_events::ClaimsRequestEvents::new(source))
        .with_authorization_code_received_handler(client_assertion::ClientSecretJwtEvents::new(
            clock,
        ))
}
