use url::Url;

use crate::error::{DuplicateParameterSnafu, EventError};

pub const CLAIMS: &str = "claims";
pub const CLIENT_ID: &str = "client_id";
pub const CLIENT_SECRET: &str = "client_secret";
pub const CLIENT_ASSERTION: &str = "client_assertion";
pub const CLIENT_ASSERTION_TYPE: &str = "client_assertion_type";

/// `client_assertion_type` of a JWT bearer client assertion (RFC 7523).
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// The parameters of an OpenID Connect request or response, in insertion order.
/// Parameter names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolMessage {
    parameters: Vec<(String, String)>,
}

impl ProtocolMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(it, _)| it == name)
            .map(|(_, value)| value.as_str())
    }

    /// Adds a new parameter. Fails if a parameter with this name already exists.
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), EventError> {
        let name = name.into();
        if self.parameter(&name).is_some() {
            return DuplicateParameterSnafu { name }.fail();
        }
        self.parameters.push((name, value.into()));
        Ok(())
    }

    /// Sets or, given `None`, removes a parameter.
    pub fn set_parameter(&mut self, name: &str, value: Option<String>) {
        let position = self.parameters.iter().position(|(it, _)| it == name);
        match (position, value) {
            (Some(position), Some(value)) => self.parameters[position].1 = value,
            (Some(position), None) => {
                self.parameters.remove(position);
            }
            (None, Some(value)) => self.parameters.push((name.to_owned(), value)),
            (None, None) => {}
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.parameter(CLIENT_ID)
    }

    pub fn set_client_id(&mut self, value: Option<String>) {
        self.set_parameter(CLIENT_ID, value);
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.parameter(CLIENT_SECRET)
    }

    pub fn set_client_secret(&mut self, value: Option<String>) {
        self.set_parameter(CLIENT_SECRET, value);
    }

    pub fn client_assertion(&self) -> Option<&str> {
        self.parameter(CLIENT_ASSERTION)
    }

    pub fn set_client_assertion(&mut self, value: Option<String>) {
        self.set_parameter(CLIENT_ASSERTION, value);
    }

    pub fn client_assertion_type(&self) -> Option<&str> {
        self.parameter(CLIENT_ASSERTION_TYPE)
    }

    pub fn set_client_assertion_type(&mut self, value: Option<String>) {
        self.set_parameter(CLIENT_ASSERTION_TYPE, value);
    }

    /// Appends all parameters as query pairs to `issuer_address`, e.g. the authorization endpoint.
    pub fn to_url(&self, issuer_address: &Url) -> Url {
        let mut url = issuer_address.clone();
        if !self.parameters.is_empty() {
            url.query_pairs_mut().extend_pairs(self.parameters());
        }
        url
    }
}

/// The request sent to the token endpoint to redeem an authorization code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenEndpointRequest {
    /// The endpoint the request will be sent to, if already known.
    pub token_endpoint: Option<String>,
    pub message: ProtocolMessage,
}
