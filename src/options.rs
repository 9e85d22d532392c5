//! Configuration-shaped input, as bound from a settings section.
//!
//! ```yaml
//! mappings:
//!   - authenticationScheme: idp-1
//!     claimsRequest:
//!       idToken:
//!         - key: given_name
//!         - key: acr
//!           essential: true
//!       userInfo:
//!         - key: email
//! ```

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::{
    case_insensitive::CaseInsensitiveMap,
    claims_request::{ClaimsMap, ClaimsRequest, ClaimsRequestItem},
    error::{ConfigurationError, CreateClaimsRequestMapSnafu, CreateClaimsRequestSnafu},
};

/// Converted claims requests by authentication scheme.
/// `None` marks a mapping without a claims request.
pub type ClaimsRequestMap = CaseInsensitiveMap<Option<ClaimsRequest>>;

/// A single requested claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsRequestItemOptions {
    #[serde(alias = "Key")]
    pub key: String,

    #[serde(default, alias = "Essential")]
    pub essential: Option<bool>,

    #[serde(default, alias = "Value")]
    pub value: Option<String>,

    #[serde(default, alias = "Values")]
    pub values: Option<Vec<String>>,
}

impl ClaimsRequestItemOptions {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    fn to_item(&self) -> Option<ClaimsRequestItem> {
        ClaimsRequestItem {
            essential: self.essential,
            value: self.value.clone(),
            values: self.values.clone(),
        }
        .into_constraint()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsRequestOptions {
    #[serde(default, alias = "IdToken")]
    pub id_token: Vec<ClaimsRequestItemOptions>,

    #[serde(default, alias = "UserInfo", alias = "userinfo")]
    pub user_info: Vec<ClaimsRequestItemOptions>,
}

impl ClaimsRequestOptions {
    /// Converts the configured items into the wire model.
    ///
    /// An empty item list leaves the corresponding map unset, so options without any item
    /// convert into a claims request serializing to `{}`.
    pub fn to_claims_request(&self) -> Result<ClaimsRequest, ConfigurationError> {
        fn to_claims_map(
            items: &[ClaimsRequestItemOptions],
        ) -> Result<Option<ClaimsMap>, ConfigurationError> {
            if items.is_empty() {
                return Ok(None);
            }
            let mut map = ClaimsMap::with_capacity(items.len());
            for item in items {
                map.try_insert(item.key.as_str(), item.to_item())?;
            }
            Ok(Some(map))
        }

        Ok(ClaimsRequest {
            id_token: to_claims_map(&self.id_token)
                .map_err(Box::new)
                .context(CreateClaimsRequestSnafu {})?,
            userinfo: to_claims_map(&self.user_info)
                .map_err(Box::new)
                .context(CreateClaimsRequestSnafu {})?,
        })
    }
}

/// Assigns a claims request to an authentication scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsRequestMappingOptions {
    #[serde(alias = "AuthenticationScheme")]
    pub authentication_scheme: String,

    #[serde(default, alias = "ClaimsRequest")]
    pub claims_request: Option<ClaimsRequestOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsRequestMapOptions {
    #[serde(default, alias = "Mappings")]
    pub mappings: Vec<ClaimsRequestMappingOptions>,
}

impl ClaimsRequestMapOptions {
    pub fn with_mapping(
        mut self,
        authentication_scheme: impl Into<String>,
        claims_request: ClaimsRequestOptions,
    ) -> Self {
        self.mappings.push(ClaimsRequestMappingOptions {
            authentication_scheme: authentication_scheme.into(),
            claims_request: Some(claims_request),
        });
        self
    }

    /// Converts all mappings, in configured order. Fails on the first duplicate scheme name
    /// (compared case-insensitively) or on the first claims request that cannot be converted.
    pub fn to_map(&self) -> Result<ClaimsRequestMap, ConfigurationError> {
        let mut map = ClaimsRequestMap::with_capacity(self.mappings.len());
        for mapping in &self.mappings {
            let claims_request = mapping
                .claims_request
                .as_ref()
                .map(ClaimsRequestOptions::to_claims_request)
                .transpose()
                .map_err(Box::new)
                .context(CreateClaimsRequestMapSnafu {})?;
            map.try_insert(mapping.authentication_scheme.as_str(), claims_request)
                .map_err(Box::new)
                .context(CreateClaimsRequestMapSnafu {})?;
        }
        Ok(map)
    }
}
