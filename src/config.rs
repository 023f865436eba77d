use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

use crate::services::gemini::GeminiConfig;

/// Upper bound for a whole HTTP request body. Base64 inflates documents by a
/// third, so this sits comfortably above the 5 MiB document ceiling.
const DEFAULT_MAX_REQUEST_BYTES: usize = 12 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub max_request_bytes: usize,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Generative model service
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: Url,
    pub gemini_temperature: f32,
    pub ai_service_timeout_seconds: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. `from_env` is this with
    /// the process environment plugged in.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Environment::parse(&lookup("ENV").unwrap_or_else(|| "dev".to_string()));
        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let max_request_bytes = lookup("MAX_REQUEST_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_REQUEST_BYTES);

        // CORS
        let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Generative model service
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .or_else(|| lookup("GOOGLE_GENAI_API_KEY"))
            .filter(|key| !key.trim().is_empty())
            .context("GEMINI_API_KEY must be set")?;
        let gemini_model =
            lookup("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string());
        let gemini_base_url = lookup("GEMINI_BASE_URL").unwrap_or_else(|| {
            "https://generativelanguage.googleapis.com/v1beta".to_string()
        });
        let gemini_base_url = Url::parse(&gemini_base_url)
            .with_context(|| format!("GEMINI_BASE_URL is not a valid URL: {gemini_base_url}"))?;
        let gemini_temperature = lookup("GEMINI_TEMPERATURE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.2);
        let ai_service_timeout_seconds = lookup("AI_SERVICE_TIMEOUT_SECONDS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(120); // 2 minutes default for LLM calls

        Ok(Settings {
            env,
            server_addr,
            max_request_bytes,
            cors_allow_origins,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            gemini_temperature,
            ai_service_timeout_seconds,
        })
    }

    /// Deadline for a single extraction round trip.
    pub fn ai_service_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_service_timeout_seconds)
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
            temperature: self.gemini_temperature,
            timeout: self.ai_service_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_api_key_is_set() {
        let settings = Settings::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k")])).unwrap();

        assert_eq!(settings.env, Environment::Dev);
        assert_eq!(settings.server_addr, "0.0.0.0:8080");
        assert_eq!(settings.gemini_model, "gemini-2.0-flash");
        assert_eq!(
            settings.gemini_base_url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(settings.ai_service_timeout(), Duration::from_secs(120));
        assert_eq!(settings.cors_allow_origins, vec!["http://localhost:3000"]);
        assert_eq!(settings.max_request_bytes, DEFAULT_MAX_REQUEST_BYTES);
    }

    #[test]
    fn api_key_is_required() {
        let err = Settings::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let err = Settings::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn google_api_key_is_accepted_as_fallback() {
        let settings = Settings::from_lookup(lookup_from(&[("GOOGLE_API_KEY", "g")])).unwrap();
        assert_eq!(settings.gemini_api_key, "g");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = Settings::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_BASE_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GEMINI_BASE_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("ENV", "production"),
            ("CORS_ALLOW_ORIGINS", "https://a.example, ,https://b.example"),
            ("AI_SERVICE_TIMEOUT_SECONDS", "15"),
            ("GEMINI_MODEL", "gemini-1.5-pro"),
        ]))
        .unwrap();

        assert!(settings.env.is_prod());
        assert_eq!(
            settings.cors_allow_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(settings.ai_service_timeout(), Duration::from_secs(15));

        let gemini = settings.gemini();
        assert_eq!(gemini.model, "gemini-1.5-pro");
        assert_eq!(gemini.timeout, Duration::from_secs(15));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("AI_SERVICE_TIMEOUT_SECONDS", "0"),
        ]))
        .unwrap();
        assert_eq!(settings.ai_service_timeout_seconds, 120);
    }
}
