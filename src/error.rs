use std::{path::PathBuf, sync::Arc};

use snafu::Snafu;

use crate::oidc_discovery;

/// Errors raised while turning configuration into claims requests.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigurationError {
    /// Two keys of a case-insensitive map only differed in casing (or were equal).
    #[snafu(display("An item with the same key has already been added. Key: {key}"))]
    DuplicateKey { key: String },

    /// A `ClaimsRequestOptions` could not be converted into a `ClaimsRequest`.
    #[snafu(display("Could not create claims-request."))]
    CreateClaimsRequest { source: Box<ConfigurationError> },

    /// The scheme to claims-request map could not be built from the configured mappings.
    #[snafu(display("Could not create dictionary from mappings."))]
    CreateClaimsRequestMap { source: Box<ConfigurationError> },

    /// A claims request could not be written as JSON.
    #[snafu(display("Could not serialize claims-request. Source: {source}"))]
    SerializeClaimsRequest { source: Arc<serde_json::Error> },

    /// The settings file could not be read.
    #[snafu(display("Could not read settings file '{}'.", path.display()))]
    ReadSettings {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },

    /// The settings could not be parsed or did not match the expected shape.
    #[snafu(display("Could not parse claims-request settings. Source: {source}"))]
    ParseSettings { source: Arc<serde_yaml::Error> },
}

/// Errors raised by the redirect and authorization-code event handlers.
#[derive(Debug, Clone, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EventError {
    /// The options of the client did not carry a client id.
    #[snafu(display("Required input 'client_id' was not provided."))]
    MissingClientId,

    /// The options of the client did not carry a client secret.
    #[snafu(display("Required input 'client_secret' was not provided."))]
    MissingClientSecret,

    /// A parameter was added to a protocol message which already contained it.
    #[snafu(display("The protocol message already contains a parameter named '{name}'."))]
    DuplicateParameter { name: String },

    /// The claims-request configuration could not be resolved.
    #[snafu(display("Could not resolve the claims-request configuration."))]
    Configuration { source: ConfigurationError },

    /// The token request had no endpoint and there is no way to discover one.
    #[snafu(display(
        "The token endpoint is unknown and no configuration manager was set up to discover it."
    ))]
    MissingConfigurationManager,

    /// The discovery document did not name a token endpoint.
    #[snafu(display("The discovery document of '{issuer}' does not contain a token endpoint."))]
    MissingTokenEndpoint { issuer: String },

    /// The client assertion could not be signed or serialized.
    #[snafu(display("Could not create the client assertion. Source: {source}"))]
    EncodeAssertion { source: Arc<jsonwebtoken::errors::Error> },

    /// Discovery failed. Passed on as reported by the discovery layer.
    #[snafu(transparent)]
    Discovery { source: oidc_discovery::RequestError },

    /// Raised by handlers registered from outside this crate.
    #[snafu(display("{message}"))]
    Handler { message: String },
}
