use std::path::Path;
use std::time::Duration;

use collegia_webhook::{DEFAULT_SIGNATURE_HEADER, DEFAULT_USER_AGENT, DeliveryConfig};
use serde::Deserialize;

use crate::dlq::DEFAULT_DEAD_LETTER_CAPACITY;
use crate::error::ConfigError;
use crate::retry::{RetryPolicy, RetryStrategy};

/// Sizing of the delivery worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of deliveries in flight at once.
    pub max_concurrent: usize,
    /// Jobs that may wait for a free worker before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 32,
            queue_capacity: 1024,
        }
    }
}

/// Webhook pipeline configuration, loaded from a TOML file.
///
/// Every section and field is optional.
///
/// ```toml
/// [delivery]
/// timeout_seconds = 10
/// user_agent = "Collegia-Webhook/1.0"
/// signature_header = "X-Webhook-Signature"
///
/// [dispatch]
/// max_concurrent = 32
/// queue_capacity = 1024
///
/// [retry]
/// enabled = false
/// max_retries = 3
/// base_delay_ms = 500
/// max_delay_ms = 30000
/// multiplier = 2.0
/// jitter = true
/// dead_letter_capacity = 1000
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhooksConfig {
    #[serde(default)]
    pub delivery: DeliverySection,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub retry: RetrySection,
}

/// Outbound request settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliverySection {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_signature_header")]
    pub signature_header: String,
}

impl Default for DeliverySection {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
            signature_header: default_signature_header(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

fn default_signature_header() -> String {
    DEFAULT_SIGNATURE_HEADER.to_owned()
}

/// Worker pool sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_max_concurrent() -> usize {
    DispatcherConfig::default().max_concurrent
}

fn default_queue_capacity() -> usize {
    DispatcherConfig::default().queue_capacity
}

/// Optional retry and dead-letter layer for live events.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_jitter")]
    pub jitter: bool,
    /// Entries the in-memory dead-letter queue keeps before evicting the
    /// oldest.
    #[serde(default = "default_dead_letter_capacity")]
    pub dead_letter_capacity: usize,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            enabled: false,
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            jitter: default_jitter(),
            dead_letter_capacity: default_dead_letter_capacity(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> bool {
    true
}

fn default_dead_letter_capacity() -> usize {
    DEFAULT_DEAD_LETTER_CAPACITY
}

impl WebhooksConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delivery.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "delivery.timeout_seconds must be greater than zero".into(),
            ));
        }
        if let Err(e) = self.delivery_config().signature_header_name() {
            return Err(ConfigError::Invalid(format!("delivery.signature_header: {e}")));
        }
        if self.dispatch.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.max_concurrent must be greater than zero".into(),
            ));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "dispatch.queue_capacity must be greater than zero".into(),
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "retry.multiplier must be a finite number of at least 1.0".into(),
            ));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::Invalid(
                "retry.max_delay_ms must not be below retry.base_delay_ms".into(),
            ));
        }
        if self.retry.dead_letter_capacity == 0 {
            return Err(ConfigError::Invalid(
                "retry.dead_letter_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig::default()
            .with_timeout_secs(self.delivery.timeout_seconds)
            .with_user_agent(self.delivery.user_agent.clone())
            .with_signature_header(self.delivery.signature_header.clone())
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            max_concurrent: self.dispatch.max_concurrent,
            queue_capacity: self.dispatch.queue_capacity,
        }
    }

    /// The retry policy for live events, or `None` when retries are disabled.
    pub fn retry_policy(&self) -> Option<RetryPolicy> {
        self.retry.enabled.then(|| RetryPolicy {
            max_retries: self.retry.max_retries,
            strategy: RetryStrategy::Exponential {
                base: Duration::from_millis(self.retry.base_delay_ms),
                max: Duration::from_millis(self.retry.max_delay_ms),
                multiplier: self.retry.multiplier,
                jitter: self.retry.jitter,
            },
        })
    }

    pub fn dead_letter_capacity(&self) -> usize {
        self.retry.dead_letter_capacity
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = WebhooksConfig::from_toml_str("").unwrap();

        assert_eq!(config.delivery_config(), DeliveryConfig::default());
        assert_eq!(config.dispatcher_config(), DispatcherConfig::default());
        assert!(config.retry_policy().is_none());
    }

    #[test]
    fn full_document() {
        let config = WebhooksConfig::from_toml_str(
            r#"
            [delivery]
            timeout_seconds = 3
            user_agent = "Collegia-Webhook/2.0"
            signature_header = "X-Collegia-Signature"

            [dispatch]
            max_concurrent = 4
            queue_capacity = 16

            [retry]
            enabled = true
            max_retries = 5
            base_delay_ms = 100
            max_delay_ms = 2000
            multiplier = 3.0
            jitter = false
            dead_letter_capacity = 50
            "#,
        )
        .unwrap();

        let delivery = config.delivery_config();
        assert_eq!(delivery.timeout, Duration::from_secs(3));
        assert_eq!(delivery.user_agent, "Collegia-Webhook/2.0");
        assert_eq!(delivery.signature_header, "X-Collegia-Signature");

        assert_eq!(
            config.dispatcher_config(),
            DispatcherConfig {
                max_concurrent: 4,
                queue_capacity: 16,
            }
        );

        let policy = config.retry_policy().unwrap();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(
            policy.strategy,
            RetryStrategy::Exponential {
                base: Duration::from_millis(100),
                max: Duration::from_secs(2),
                multiplier: 3.0,
                jitter: false,
            }
        );
        assert_eq!(config.dead_letter_capacity(), 50);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = WebhooksConfig::from_toml_str("[dispatch]\nmax_concurrent = 2\n").unwrap();
        assert_eq!(config.dispatch.max_concurrent, 2);
        assert_eq!(config.dispatch.queue_capacity, 1024);
        assert_eq!(config.delivery.timeout_seconds, 10);
    }

    #[test]
    fn rejects_zero_values() {
        for doc in [
            "[delivery]\ntimeout_seconds = 0\n",
            "[dispatch]\nmax_concurrent = 0\n",
            "[dispatch]\nqueue_capacity = 0\n",
            "[delivery]\nsignature_header = \"\"\n",
            "[retry]\nmultiplier = 0.5\n",
            "[retry]\nbase_delay_ms = 10\nmax_delay_ms = 5\n",
            "[retry]\ndead_letter_capacity = 0\n",
        ] {
            let err = WebhooksConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{doc}: {err}");
        }
    }

    #[test]
    fn rejects_malformed_signature_header_name() {
        for name in ["X Bad Header", "X-Sig:", "  "] {
            let doc = format!("[delivery]\nsignature_header = {name:?}\n");
            let err = WebhooksConfig::from_toml_str(&doc).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{doc}: {err}");
            assert!(err.to_string().contains("signature_header"));
        }
    }

    #[test]
    fn rejects_unknown_fields_and_bad_syntax() {
        let err = WebhooksConfig::from_toml_str("[delivery]\ntimeout = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = WebhooksConfig::from_toml_str("[delivery").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retry]\nenabled = true").unwrap();

        let config = WebhooksConfig::load(file.path()).unwrap();
        assert_eq!(config.retry_policy().unwrap().max_retries, 3);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = WebhooksConfig::load("/nonexistent/collegia-webhooks.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
