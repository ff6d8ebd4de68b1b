//! Process-wide configuration, resolved once at startup and passed explicitly
//! into the components that need it.

use std::fmt;
use std::time::Duration;

use crate::facade_pipeline::common::error::{FacadeError, Result};
use crate::facade_pipeline::palette::ColorReferenceTable;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-3.1-flash-image-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Credential for the image-editing service. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the key through `lookup`; a missing or blank value is fatal.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(API_KEY_VAR) {
            Some(key) if !key.trim().is_empty() => Ok(Self(key.trim().to_string())),
            _ => Err(FacadeError::Config(format!(
                "{API_KEY_VAR} is not set; export it before running the pipeline"
            ))),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Image model used by every stage
    pub model: String,
    /// Base URL of the generative API, without the `/models/...` suffix
    pub endpoint: String,
    /// Upper bound on one stage request. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// Attempts per stage, counting the first. Only retryable errors are repeated.
    pub max_attempts: u32,
    /// Reference colors and rejection band for the mask classifier
    pub palette: ColorReferenceTable,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: None,
            max_attempts: 1,
            palette: ColorReferenceTable::default(),
        }
    }
}

impl PipelineConfig {
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Defaults overridden by `GEMINI_MODEL`, `GEMINI_ENDPOINT`,
    /// `FACADE_TIMEOUT_SECS`, `FACADE_MAX_ATTEMPTS` and `FACADE_REJECTION_THRESHOLD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(model) = lookup("GEMINI_MODEL") {
            builder = builder.model(model);
        }
        if let Some(endpoint) = lookup("GEMINI_ENDPOINT") {
            builder = builder.endpoint(endpoint);
        }
        if let Some(secs) = lookup("FACADE_TIMEOUT_SECS") {
            let secs: u64 = parse_var("FACADE_TIMEOUT_SECS", &secs)?;
            builder = builder.request_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        if let Some(attempts) = lookup("FACADE_MAX_ATTEMPTS") {
            builder = builder.max_attempts(parse_var("FACADE_MAX_ATTEMPTS", &attempts)?);
        }
        if let Some(threshold) = lookup("FACADE_REJECTION_THRESHOLD") {
            builder = builder.rejection_threshold(parse_var("FACADE_REJECTION_THRESHOLD", &threshold)?);
        }

        let config = builder.build();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(FacadeError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(FacadeError::Config("model name must not be empty".to_string()));
        }
        self.palette.validate()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FacadeError::Config(format!("{name} has an invalid value: {value:?}")))
}

/// Builder for PipelineConfig
#[derive(Default)]
pub struct PipelineConfigBuilder {
    model: Option<String>,
    endpoint: Option<String>,
    request_timeout: Option<Option<Duration>>,
    max_attempts: Option<u32>,
    palette: Option<ColorReferenceTable>,
    rejection_threshold: Option<f64>,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn palette(mut self, palette: ColorReferenceTable) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Overrides only the rejection band of whatever palette is in effect.
    pub fn rejection_threshold(mut self, threshold: f64) -> Self {
        self.rejection_threshold = Some(threshold);
        self
    }

    pub fn build(self) -> PipelineConfig {
        let default = PipelineConfig::default();
        let mut palette = self.palette.unwrap_or(default.palette);
        if let Some(threshold) = self.rejection_threshold {
            palette.rejection_threshold = threshold;
        }
        PipelineConfig {
            model: self.model.unwrap_or(default.model),
            endpoint: self.endpoint.unwrap_or(default.endpoint),
            request_timeout: self.request_timeout.unwrap_or(default.request_timeout),
            max_attempts: self.max_attempts.unwrap_or(default.max_attempts),
            palette,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_have_no_timeout_and_no_retry() {
        let config = PipelineConfig::default();
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::builder()
            .model("other-model")
            .request_timeout(Some(Duration::from_secs(90)))
            .max_attempts(3)
            .rejection_threshold(80.0)
            .build();

        assert_eq!(config.model, "other-model");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.palette.rejection_threshold, 80.0);
        assert_eq!(config.palette.window, [255, 0, 0]);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = PipelineConfig::from_lookup(env(&[
            ("GEMINI_MODEL", "m"),
            ("FACADE_TIMEOUT_SECS", "45"),
            ("FACADE_MAX_ATTEMPTS", "2"),
            ("FACADE_REJECTION_THRESHOLD", "120.5"),
        ]))
        .unwrap();

        assert_eq!(config.model, "m");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(45)));
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.palette.rejection_threshold, 120.5);
    }

    #[test]
    fn test_zero_timeout_means_unbounded() {
        let config = PipelineConfig::from_lookup(env(&[("FACADE_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let bad_number = PipelineConfig::from_lookup(env(&[("FACADE_MAX_ATTEMPTS", "many")]));
        assert!(matches!(bad_number, Err(FacadeError::Config(_))));

        let zero_attempts = PipelineConfig::from_lookup(env(&[("FACADE_MAX_ATTEMPTS", "0")]));
        assert!(matches!(zero_attempts, Err(FacadeError::Config(_))));

        let negative = PipelineConfig::from_lookup(env(&[("FACADE_REJECTION_THRESHOLD", "-1")]));
        assert!(matches!(negative, Err(FacadeError::Config(_))));
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        assert!(matches!(ApiKey::from_lookup(env(&[])), Err(FacadeError::Config(_))));
        assert!(matches!(
            ApiKey::from_lookup(env(&[(API_KEY_VAR, "   ")])),
            Err(FacadeError::Config(_))
        ));
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::from_lookup(env(&[(API_KEY_VAR, " secret-value ")])).unwrap();
        assert_eq!(key.expose(), "secret-value");
        assert!(!format!("{key:?}").contains("secret"));
    }
}
