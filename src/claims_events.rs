use std::sync::Arc;

use futures::future::BoxFuture;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    error::{ConfigurationError, ConfigurationSnafu, EventError},
    events::{OidcClientOptions, RedirectContext, RedirectHandler},
    message::CLAIMS,
    settings::ClaimsRequestMapSource,
};

/// Attaches the claims request configured for the redirect's authentication scheme.
///
/// The configuration is read from the source on every redirect, so replacing the source's
/// snapshot takes effect with the next redirect.
#[derive(Clone)]
pub struct ClaimsRequestEvents {
    source: Arc<dyn ClaimsRequestMapSource>,
}

impl ClaimsRequestEvents {
    pub fn new(source: Arc<dyn ClaimsRequestMapSource>) -> Self {
        Self { source }
    }

    /// Adds the `claims` parameter to the outgoing message if a claims request is configured
    /// for `context.scheme`. Does nothing otherwise.
    #[tracing::instrument(level = "debug", skip_all, fields(scheme = %context.scheme))]
    pub fn redirect_to_identity_provider(
        &self,
        context: &mut RedirectContext,
    ) -> Result<(), EventError> {
        debug!("Redirect to identity provider to handle claims-request starting...");

        let claims_request_map_options = self.source.current();

        let Some(claims_request_json) = claims_request_map_options
            .claims_request_json(&context.scheme)
            .context(ConfigurationSnafu {})?
        else {
            return Ok(());
        };

        debug!(
            "Setting open-id-connect-message claims-parameter for \"{}\" to \"{}\".",
            context.scheme, claims_request_json
        );

        context
            .protocol_message
            .add_parameter(CLAIMS, claims_request_json)
    }
}

impl RedirectHandler for ClaimsRequestEvents {
    fn on_redirect_to_identity_provider<'a>(
        &'a self,
        context: &'a mut RedirectContext,
    ) -> BoxFuture<'a, Result<(), EventError>> {
        Box::pin(std::future::ready(self.redirect_to_identity_provider(context)))
    }
}

/// Attaches a claims request resolved ahead of time.
#[derive(Debug, Clone)]
struct ClaimsParameter {
    scheme: String,
    claims_request_json: String,
}

impl RedirectHandler for ClaimsParameter {
    fn on_redirect_to_identity_provider<'a>(
        &'a self,
        context: &'a mut RedirectContext,
    ) -> BoxFuture<'a, Result<(), EventError>> {
        debug!(
            "Setting open-id-connect-message claims-parameter for \"{}\" to \"{}\".",
            self.scheme, self.claims_request_json
        );
        Box::pin(std::future::ready(
            context
                .protocol_message
                .add_parameter(CLAIMS, self.claims_request_json.clone()),
        ))
    }
}

/// Resolves claims requests once, while clients are configured, instead of on every redirect.
#[derive(Clone)]
pub struct PostConfigureClaimsRequest {
    source: Arc<dyn ClaimsRequestMapSource>,
}

impl PostConfigureClaimsRequest {
    pub fn new(source: Arc<dyn ClaimsRequestMapSource>) -> Self {
        Self { source }
    }

    /// Registers a redirect handler attaching the claims request of the client named `name`,
    /// after all handlers already registered on `options`.
    /// Leaves `options` untouched if no claims request is configured for `name`.
    #[tracing::instrument(level = "debug", skip_all, fields(name = %name))]
    pub fn post_configure(
        &self,
        name: &str,
        options: &mut OidcClientOptions,
    ) -> Result<(), ConfigurationError> {
        debug!(
            "Post-configuration of claims-request for open-id-connect-options \"{name}\" starting..."
        );

        let Some(claims_request_json) = self.source.current().claims_request_json(name)? else {
            return Ok(());
        };

        options.events.push_redirect_handler(Arc::new(ClaimsParameter {
            scheme: name.to_owned(),
            claims_request_json,
        }));

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use assertr::prelude::*;

    use crate::{
        events::{OidcClientOptions, OidcEvents, RedirectContext, RedirectFn},
        options::{ClaimsRequestItemOptions, ClaimsRequestMapOptions, ClaimsRequestOptions},
        settings::{ReloadableClaimsRequestMap, StaticClaimsRequestMap},
    };

    use super::{ClaimsRequestEvents, PostConfigureClaimsRequest};

    fn key_1_mapping(scheme: &str) -> ClaimsRequestMapOptions {
        ClaimsRequestMapOptions::default().with_mapping(
            scheme,
            ClaimsRequestOptions {
                id_token: vec![ClaimsRequestItemOptions::new("Key-1")],
                user_info: vec![],
            },
        )
    }

    fn claims_request_events(options: ClaimsRequestMapOptions) -> ClaimsRequestEvents {
        ClaimsRequestEvents::new(Arc::new(StaticClaimsRequestMap::new(options)))
    }

    #[test]
    fn attaches_exactly_one_claims_parameter() {
        let events = claims_request_events(key_1_mapping("Test"));
        let mut context = RedirectContext::new("Test");

        events.redirect_to_identity_provider(&mut context).unwrap();

        assert_that(context.protocol_message.len()).is_equal_to(1);
        assert_that(context.protocol_message.parameters().next())
            .is_equal_to(Some(("claims", r#"{"id_token":{"Key-1":null}}"#)));
    }

    #[test]
    fn other_schemes_get_nothing() {
        let events = claims_request_events(key_1_mapping("Test"));
        let mut context = RedirectContext::new("Other");

        events.redirect_to_identity_provider(&mut context).unwrap();

        assert_that(context.protocol_message.is_empty()).is_equal_to(true);
    }

    #[test]
    fn empty_claims_requests_are_not_attached() {
        let mut options = ClaimsRequestMapOptions::default()
            .with_mapping("empty", ClaimsRequestOptions::default())
            .with_mapping("absent", ClaimsRequestOptions::default());
        options.mappings[1].claims_request = None;
        let events = claims_request_events(options);

        for scheme in ["empty", "absent"] {
            let mut context = RedirectContext::new(scheme);
            events.redirect_to_identity_provider(&mut context).unwrap();
            assert_that(context.protocol_message.is_empty()).is_equal_to(true);
        }
    }

    #[test]
    fn independent_redirects_receive_identical_json() {
        let events = claims_request_events(key_1_mapping("Test"));
        let mut first = RedirectContext::new("Test");
        let mut second = RedirectContext::new("test");

        events.redirect_to_identity_provider(&mut first).unwrap();
        events.redirect_to_identity_provider(&mut second).unwrap();

        let first = first.protocol_message.parameter("claims").map(str::to_owned);
        let second = second.protocol_message.parameter("claims").map(str::to_owned);
        assert_that(first.is_some()).is_equal_to(true);
        assert_that(first).is_equal_to(second);
    }

    #[test]
    fn invalid_configuration_is_reported() {
        let options = key_1_mapping("Test").with_mapping("TEST", ClaimsRequestOptions::default());
        let events = claims_request_events(options);
        let mut context = RedirectContext::new("Test");

        let result = events.redirect_to_identity_provider(&mut context);

        assert_that(result.is_err()).is_equal_to(true);
        assert_that(context.protocol_message.is_empty()).is_equal_to(true);
    }

    #[test]
    fn snapshot_changes_apply_to_the_next_redirect() {
        let source = Arc::new(ReloadableClaimsRequestMap::new(Default::default()));
        let events = ClaimsRequestEvents::new(source.clone());

        let mut before = RedirectContext::new("Test");
        events.redirect_to_identity_provider(&mut before).unwrap();
        source.store(key_1_mapping("Test"));
        let mut after = RedirectContext::new("Test");
        events.redirect_to_identity_provider(&mut after).unwrap();

        assert_that(before.protocol_message.is_empty()).is_equal_to(true);
        assert_that(after.protocol_message.len()).is_equal_to(1);
    }

    #[tokio::test]
    async fn post_configure_composes_with_existing_handlers() {
        let source = StaticClaimsRequestMap::new(key_1_mapping("Test"));
        let post_configure = PostConfigureClaimsRequest::new(Arc::new(source));
        let add_scheme = RedirectFn(|context: &mut RedirectContext| {
            context
                .protocol_message
                .add_parameter("AuthenticationScheme", context.scheme.clone())
        });
        let mut options = OidcClientOptions::builder()
            .events(OidcEvents::default().with_redirect_handler(add_scheme))
            .build();

        post_configure.post_configure("Test", &mut options).unwrap();
        let mut context = RedirectContext::new("Test");
        options
            .events
            .redirect_to_identity_provider(&mut context)
            .await
            .unwrap();

        assert_that(
            context
                .protocol_message
                .parameters()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect::<Vec<_>>(),
        )
        .is_equal_to(vec![
            (String::from("AuthenticationScheme"), String::from("Test")),
            (String::from("claims"), String::from(r#"{"id_token":{"Key-1":null}}"#)),
        ]);
    }

    #[test]
    fn post_configure_without_claims_request_leaves_options_untouched() {
        let post_configure =
            PostConfigureClaimsRequest::new(Arc::new(StaticClaimsRequestMap::default()));
        let mut options = OidcClientOptions::builder().build();

        post_configure.post_configure("Test", &mut options).unwrap();

        assert_that(options.events.num_redirect_handlers()).is_equal_to(0);
    }
}
