use std::{fmt::Debug, sync::Arc};

use futures::future::BoxFuture;
use reqwest::IntoUrl;
use snafu::{ResultExt, Snafu};
use url::Url;

use crate::{abort::RequestAborted, oidc::DiscoveryDocument};

#[derive(Debug, Clone, Snafu)]
pub enum RequestError {
    #[snafu(display("RequestError: Could not send request"))]
    Send { source: Arc<reqwest::Error> },

    #[snafu(display("RequestError: Could not decode payload"))]
    Decode { source: Arc<reqwest::Error> },

    #[snafu(display("RequestError: The request was aborted"))]
    Aborted,
}

pub(crate) async fn retrieve_discovery_document(
    client: &reqwest::Client,
    discovery_endpoint: impl IntoUrl,
) -> Result<DiscoveryDocument, RequestError> {
    client
        .get(discovery_endpoint)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(Arc::new)
        .context(SendSnafu {})?
        .json::<DiscoveryDocument>()
        .await
        .map_err(Arc::new)
        .context(DecodeSnafu {})
}

/// Supplies the discovery document of the identity provider.
pub trait ConfigurationManager: Debug + Send + Sync {
    fn get_configuration<'a>(
        &'a self,
        request_aborted: &'a RequestAborted,
    ) -> BoxFuture<'a, Result<DiscoveryDocument, RequestError>>;
}

/// Fetches the discovery document over HTTP on every call.
#[derive(Debug, Clone)]
pub struct HttpConfigurationManager {
    discovery_endpoint: Url,
    client: reqwest::Client,
}

impl HttpConfigurationManager {
    pub fn new(discovery_endpoint: Url) -> Self {
        Self {
            discovery_endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Uses `{authority}/.well-known/openid-configuration`.
    pub fn from_authority(authority: &Url) -> Result<Self, url::ParseError> {
        let mut base = authority.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Ok(Self::new(base.join(".well-known/openid-configuration")?))
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn discovery_endpoint(&self) -> &Url {
        &self.discovery_endpoint
    }
}

impl ConfigurationManager for HttpConfigurationManager {
    fn get_configuration<'a>(
        &'a self,
        request_aborted: &'a RequestAborted,
    ) -> BoxFuture<'a, Result<DiscoveryDocument, RequestError>> {
        Box::pin(async move {
            tracing::debug!(
                discovery_endpoint = %self.discovery_endpoint,
                "Retrieving discovery document."
            );
            let retrieve =
                retrieve_discovery_document(&self.client, self.discovery_endpoint.clone());
            tokio::select! {
                biased;
                _ = request_aborted.aborted() => AbortedSnafu {}.fail(),
                result = retrieve => result,
            }
        })
    }
}

/// Serves a fixed discovery document.
#[derive(Debug, Clone)]
pub struct StaticConfigurationManager(pub DiscoveryDocument);

impl ConfigurationManager for StaticConfigurationManager {
    fn get_configuration<'a>(
        &'a self,
        _request_aborted: &'a RequestAborted,
    ) -> BoxFuture<'a, Result<DiscoveryDocument, RequestError>> {
        Box::pin(std::future::ready(Ok(self.0.clone())))
    }
}
