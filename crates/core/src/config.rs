//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the services. Nothing
//! in this crate reads process-wide environment variables during request handling.

use crate::constants::DEFAULT_API_BASE;
use crate::error::{FlowError, FlowResult};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    api_base: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `api_base` is either an absolute path (`/api/v1`) or an `http(s)://` URL. A trailing `/`
    /// is dropped so paths can be appended directly.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidConfig`] if the base is empty, contains whitespace, or is
    /// neither an absolute path nor an HTTP URL.
    pub fn new(api_base: impl Into<String>) -> FlowResult<Self> {
        let api_base = api_base.into();
        let trimmed = api_base.trim();

        if trimmed.is_empty() {
            return Err(FlowError::InvalidConfig("api_base cannot be empty".into()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(FlowError::InvalidConfig(format!(
                "api_base must not contain whitespace: '{api_base}'"
            )));
        }
        let is_url = trimmed.starts_with("http://") || trimmed.starts_with("https://");
        if !is_url && !trimmed.starts_with('/') {
            return Err(FlowError::InvalidConfig(format!(
                "api_base must start with '/' or http(s)://, got: '{api_base}'"
            )));
        }
        if is_url {
            url::Url::parse(trimmed)
                .map_err(|e| FlowError::InvalidConfig(format!("api_base is not a URL: {e}")))?;
        }

        Ok(Self {
            api_base: trimmed.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// The API base joined with a resource path (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Pick the API base from an optional (environment-sourced) value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_API_BASE`]. The value is not
/// validated here; pass it to [`CoreConfig::new`].
pub fn api_base_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let cfg = CoreConfig::new("https://hmis.example.org/api/v2/").expect("valid base");
        assert_eq!(cfg.api_base(), "https://hmis.example.org/api/v2");
        assert_eq!(
            cfg.url("/ipd/flows"),
            "https://hmis.example.org/api/v2/ipd/flows"
        );
    }

    #[test]
    fn rejects_malformed_bases() {
        for base in ["", "   ", "api/v1", "/api /v1", "ftp://host/api"] {
            let err = CoreConfig::new(base).unwrap_err();
            assert!(matches!(err, FlowError::InvalidConfig(_)), "{base:?}");
        }
    }

    #[test]
    fn env_value_falls_back_to_default() {
        assert_eq!(api_base_from_env_value(None), DEFAULT_API_BASE);
        assert_eq!(api_base_from_env_value(Some("  ".into())), DEFAULT_API_BASE);
        assert_eq!(api_base_from_env_value(Some(" /hmis ".into())), "/hmis");
        assert_eq!(CoreConfig::default().url("/opd/flows"), "/api/v1/opd/flows");
    }
}
