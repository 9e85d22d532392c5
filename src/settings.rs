use std::{path::Path, sync::Arc};

use arc_swap::ArcSwap;
use snafu::ResultExt;

use crate::{
    case_insensitive::eq_ignore_case,
    error::{ConfigurationError, ParseSettingsSnafu, ReadSettingsSnafu},
    options::ClaimsRequestMapOptions,
};

/// Section read by default. Segments are separated by `:`.
pub const DEFAULT_SECTION_PATH: &str = "Authentication:OpenIdConnect:ClaimsRequest";

/// Provides the claims-request configuration that is current at the moment of the call.
pub trait ClaimsRequestMapSource: Send + Sync {
    fn current(&self) -> Arc<ClaimsRequestMapOptions>;
}

/// A source that never changes.
#[derive(Debug, Clone, Default)]
pub struct StaticClaimsRequestMap(Arc<ClaimsRequestMapOptions>);

impl StaticClaimsRequestMap {
    pub fn new(options: ClaimsRequestMapOptions) -> Self {
        Self(Arc::new(options))
    }
}

impl ClaimsRequestMapSource for StaticClaimsRequestMap {
    fn current(&self) -> Arc<ClaimsRequestMapOptions> {
        self.0.clone()
    }
}

/// A source whose snapshot can be replaced while readers are active.
/// Readers always observe either the previous or the new snapshot as a whole.
#[derive(Debug)]
pub struct ReloadableClaimsRequestMap {
    data: ArcSwap<ClaimsRequestMapOptions>,
}

impl ReloadableClaimsRequestMap {
    pub fn new(options: ClaimsRequestMapOptions) -> Self {
        Self {
            data: ArcSwap::from_pointee(options),
        }
    }

    /// Reads the initial snapshot from a settings file.
    pub fn from_file(
        path: impl AsRef<Path>,
        section_path: &str,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new(read_settings_file(path, section_path)?))
    }

    pub fn store(&self, options: ClaimsRequestMapOptions) {
        self.data.store(Arc::new(options));
    }

    /// Replaces the snapshot with the content of a settings file.
    /// The previous snapshot is kept if the file can not be read or parsed.
    pub fn reload_from_file(
        &self,
        path: impl AsRef<Path>,
        section_path: &str,
    ) -> Result<(), ConfigurationError> {
        let path = path.as_ref();
        match read_settings_file(path, section_path) {
            Ok(options) => {
                tracing::debug!(
                    path = %path.display(),
                    mappings = options.mappings.len(),
                    "Reloaded claims-request settings."
                );
                self.store(options);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    err = snafu::Report::from_error(err.clone()).to_string(),
                    "Keeping previous claims-request settings."
                );
                Err(err)
            }
        }
    }
}

impl ClaimsRequestMapSource for ReloadableClaimsRequestMap {
    fn current(&self) -> Arc<ClaimsRequestMapOptions> {
        self.data.load_full()
    }
}

impl<T: ClaimsRequestMapSource + ?Sized> ClaimsRequestMapSource for Arc<T> {
    fn current(&self) -> Arc<ClaimsRequestMapOptions> {
        (**self).current()
    }
}

/// Reads the claims-request map from a YAML (or JSON) settings file.
pub fn read_settings_file(
    path: impl AsRef<Path>,
    section_path: &str,
) -> Result<ClaimsRequestMapOptions, ConfigurationError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(Arc::new)
        .context(ReadSettingsSnafu { path })?;
    parse_settings(&contents, section_path)
}

/// Parses settings and binds the section at `section_path` (segments separated by `:`,
/// compared case-insensitively). A missing section binds to empty options.
pub fn parse_settings(
    contents: &str,
    section_path: &str,
) -> Result<ClaimsRequestMapOptions, ConfigurationError> {
    let root: serde_yaml::Value = serde_yaml::from_str(contents)
        .map_err(Arc::new)
        .context(ParseSettingsSnafu {})?;

    let mut section = &root;
    for segment in section_path.split(':').filter(|it| !it.is_empty()) {
        let child = section.as_mapping().and_then(|mapping| {
            mapping
                .iter()
                .find(|(key, _)| key.as_str().is_some_and(|key| eq_ignore_case(key, segment)))
                .map(|(_, value)| value)
        });
        match child {
            Some(child) => section = child,
            None => {
                tracing::debug!(
                    section_path,
                    "Claims-request section not found. Using empty settings."
                );
                return Ok(ClaimsRequestMapOptions::default());
            }
        }
    }

    if section.is_null() {
        return Ok(ClaimsRequestMapOptions::default());
    }

    serde_yaml::from_value(section.clone())
        .map_err(Arc::new)
        .context(ParseSettingsSnafu {})
}

#[cfg(test)]
mod test {
    use assertr::prelude::*;

    use crate::settings::ClaimsRequestMapSource;

    use super::{DEFAULT_SECTION_PATH, ReloadableClaimsRequestMap, parse_settings};

    const SETTINGS: &str = r#"
authentication:
  openIdConnect:
    claimsRequest:
      mappings:
        - authenticationScheme: scheme-1
          claimsRequest:
            idToken:
              - key: key-1
              - key: key-2
                essential: true
            userInfo:
              - key: key-1
        - authenticationScheme: scheme-2
"#;

    #[test]
    fn binds_nested_section_ignoring_case() {
        let options = parse_settings(SETTINGS, DEFAULT_SECTION_PATH).unwrap();

        assert_that(options.mappings.len()).is_equal_to(2);
        assert_that(options.claims_request_json("scheme-1").unwrap()).is_equal_to(Some(
            String::from(
                r#"{"id_token":{"key-1":null,"key-2":{"essential":true}},"userinfo":{"key-1":null}}"#,
            ),
        ));
        assert_that(options.claims_request_json("scheme-2").unwrap()).is_equal_to(None);
    }

    #[test]
    fn accepts_json() {
        const SETTINGS_JSON: &str = r#"{"Claims":{"Mappings":[
            {"AuthenticationScheme":"s","ClaimsRequest":{"IdToken":[{"Key":"k","Value":"v"}]}}
        ]}}"#;

        let options = parse_settings(SETTINGS_JSON, "Claims").unwrap();

        assert_that(options.claims_request_json("s").unwrap())
            .is_equal_to(Some(String::from(r#"{"id_token":{"k":{"value":"v"}}}"#)));
    }

    #[test]
    fn missing_section_binds_empty_options() {
        let options = parse_settings("other: 1", DEFAULT_SECTION_PATH).unwrap();

        assert_that(options.mappings.is_empty()).is_equal_to(true);
    }

    #[test]
    fn malformed_section_is_an_error() {
        let result = parse_settings("claims:\n  mappings: 5", "claims");

        assert_that(result.is_err()).is_equal_to(true);
    }

    #[test]
    fn store_replaces_the_snapshot() {
        let source = ReloadableClaimsRequestMap::new(Default::default());
        let before = source.current();

        source.store(parse_settings(SETTINGS, DEFAULT_SECTION_PATH).unwrap());

        assert_that(before.mappings.len()).is_equal_to(0);
        assert_that(source.current().mappings.len()).is_equal_to(2);
    }

    #[test]
    fn failed_reload_keeps_the_previous_snapshot() {
        let options = parse_settings(SETTINGS, DEFAULT_SECTION_PATH).unwrap();
        let source = ReloadableClaimsRequestMap::new(options);

        let result =
            source.reload_from_file("/this/file/does/not/exist.yaml", DEFAULT_SECTION_PATH);

        assert_that(result.is_err()).is_equal_to(true);
        assert_that(source.current().mappings.len()).is_equal_to(2);
    }
}
