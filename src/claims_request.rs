use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::{
    case_insensitive::CaseInsensitiveMap,
    error::{ConfigurationError, SerializeClaimsRequestSnafu},
};

/// Requested claims of either the ID token or the userinfo response.
/// A `None` value requests the claim without further constraints and is written as `null`.
pub type ClaimsMap = CaseInsensitiveMap<Option<ClaimsRequestItem>>;

/// Constraints on a single requested claim.
///
/// See: `https://openid.net/specs/openid-connect-core-1_0.html#IndividualClaimsRequests`
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsRequestItem {
    /// Whether the claim is required for the authorization to be considered complete.
    pub essential: Option<bool>,

    /// Requests the claim to be returned with this particular value.
    pub value: Option<String>,

    /// Requests the claim to be returned with one of these values, in order of preference.
    pub values: Option<Vec<String>>,
}

impl ClaimsRequestItem {
    /// True if none of the fields is set. Such an item carries no constraint.
    pub fn is_unconstrained(&self) -> bool {
        self.essential.is_none() && self.value.is_none() && self.values.is_none()
    }

    /// Collapses an unconstrained item into `None`.
    pub fn into_constraint(self) -> Option<Self> {
        match self.is_unconstrained() {
            true => None,
            false => Some(self),
        }
    }
}

/// The value of the OIDC `claims` authorization request parameter.
///
/// See: `https://openid.net/specs/openid-connect-core-1_0.html#ClaimsParameter`
///
/// An unset map (`None`) is omitted from the JSON output, while a set but empty map is
/// written as `{}`. Deserializing an explicit `null` yields an unset map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimsRequest {
    #[serde(rename = "id_token", default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<ClaimsMap>,

    #[serde(rename = "userinfo", default, skip_serializing_if = "Option::is_none")]
    pub userinfo: Option<ClaimsMap>,
}

impl ClaimsRequest {
    /// True if neither map contains an entry, be it unset or set but empty.
    pub fn is_empty(&self) -> bool {
        self.id_token.as_ref().is_none_or(|it| it.is_empty())
            && self.userinfo.as_ref().is_none_or(|it| it.is_empty())
    }

    /// Compact JSON, as sent in the `claims` parameter.
    pub fn to_json(&self) -> Result<String, ConfigurationError> {
        serde_json::to_string(self)
            .map_err(Arc::new)
            .context(SerializeClaimsRequestSnafu {})
    }

    /// Indented JSON, useful for diagnostics.
    pub fn to_json_pretty(&self) -> Result<String, ConfigurationError> {
        serde_json::to_string_pretty(self)
            .map_err(Arc::new)
            .context(SerializeClaimsRequestSnafu {})
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for ClaimsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
