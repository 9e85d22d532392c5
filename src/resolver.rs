use tracing::debug;

use crate::{
    claims_request::ClaimsRequest,
    error::ConfigurationError,
    options::{ClaimsRequestMap, ClaimsRequestMapOptions},
};

/// Looks up the claims request of `authentication_scheme`.
///
/// Returns `None` if the scheme is not mapped, is mapped without a claims request, or is mapped
/// to a claims request whose maps are both unset or empty. A request with one non-empty map is
/// returned even if the other map is set but empty.
pub fn find_claims_request<'a>(
    map: &'a ClaimsRequestMap,
    authentication_scheme: &str,
) -> Option<&'a ClaimsRequest> {
    map.get(authentication_scheme)
        .and_then(Option::as_ref)
        .filter(|claims_request| !claims_request.is_empty())
}

impl ClaimsRequestMapOptions {
    /// Resolves the compact `claims` parameter value for `authentication_scheme`.
    ///
    /// `Ok(None)` means that no claims request is configured for the scheme.
    /// The options are converted on every call, so the result always reflects these options.
    pub fn claims_request_json(
        &self,
        authentication_scheme: &str,
    ) -> Result<Option<String>, ConfigurationError> {
        let map = self.to_map()?;

        let Some(claims_request) = find_claims_request(&map, authentication_scheme) else {
            debug!(
                "There is no claims-request configured for open-id-connect-options \"{}\".",
                authentication_scheme
            );
            return Ok(None);
        };

        let json = claims_request.to_json()?;
        debug!(
            "Claims-request for open-id-connect-options \"{}\" is \"{}\".",
            authentication_scheme, json
        );

        Ok(Some(json))
    }
}
