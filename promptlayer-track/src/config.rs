use std::env;
use std::time::Duration;

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};

use promptlayer_core::PromptLayerError;

pub const DEFAULT_API_URL: &str = "https://api.promptlayer.com";

/// Backoff applied to 5xx, 429 and transport failures.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub max_delay: Duration,
    pub randomize: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            factor: 2,
            max_delay: Duration::from_secs(8),
            randomize: true,
        }
    }
}

impl RetryPolicy {
    /// No retries: every failure is final.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before the `retry`-th retry (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let delay = self
            .base_delay
            .saturating_mul(self.factor.saturating_pow(exponent))
            .min(self.max_delay);
        if !self.randomize {
            return delay;
        }
        let jitter: f64 = rand::thread_rng().gen_range(1.0..2.0);
        Duration::try_from_secs_f64(delay.as_secs_f64() * jitter)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Clone, Debug)]
pub struct PromptLayerConfig {
    pub api_key: SecretString,
    pub api_url: String,
    /// Strict mode: tracking failures are returned as errors instead of
    /// being logged and swallowed.
    pub throw_on_error: bool,
    pub retry: RetryPolicy,
    pub timeout: Option<Duration>,
}

impl PromptLayerConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
            throw_on_error: true,
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }

    /// Reads `PROMPTLAYER_API_KEY` and, optionally, `PROMPTLAYER_API_URL`.
    pub fn from_env() -> Result<Self, PromptLayerError> {
        let api_key = env::var("PROMPTLAYER_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(PromptLayerError::InvalidConfig(
                "PROMPTLAYER_API_KEY is not set".to_string(),
            ));
        }
        let mut config = Self::new(SecretString::new(api_key));
        if let Ok(api_url) = env::var("PROMPTLAYER_API_URL") {
            if !api_url.trim().is_empty() {
                config.api_url = api_url;
            }
        }
        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    pub(crate) fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_and_is_capped() {
        let policy = RetryPolicy {
            randomize: false,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5), Duration::from_secs(8));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for retry in 1..=3 {
            let delay = policy.delay_for(retry);
            let floor = Duration::from_secs(1 << (retry - 1));
            assert!(delay >= floor, "{delay:?} < {floor:?}");
            assert!(delay <= policy.max_delay);
        }
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = PromptLayerConfig::new(SecretString::new("pl_secret".to_string()));
        assert!(!format!("{config:?}").contains("pl_secret"));
    }
}
