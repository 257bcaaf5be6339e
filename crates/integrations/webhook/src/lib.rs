//! Signed HTTP webhook delivery for Collegia.
//!
//! This crate turns a [`Subscription`](collegia_core::Subscription) and a
//! [`WebhookPayload`](collegia_core::WebhookPayload) into exactly one outbound
//! HTTP POST, signed with HMAC-SHA256 when the subscription carries a secret.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use collegia_webhook::{DeliveryConfig, DeliveryExecutor};
//!
//! # fn main() -> Result<(), collegia_webhook::DeliveryError> {
//! let config = DeliveryConfig::default().with_timeout_secs(5);
//! let executor = DeliveryExecutor::new(config)?;
//! # let _ = executor;
//! # Ok(())
//! # }
//! ```
//!
//! Receivers authenticate a delivery with [`verify`]:
//!
//! ```rust
//! let body = br#"{"data":{},"event":"test","timestamp":"2026-10-19T12:00:00Z"}"#;
//! let signature = collegia_webhook::sign("s3cr3t", body).unwrap();
//! assert!(collegia_webhook::verify("s3cr3t", body, &signature));
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod signer;
pub mod types;

pub use config::{DEFAULT_SIGNATURE_HEADER, DEFAULT_USER_AGENT, DeliveryConfig};
pub use error::{DeliveryError, DeliveryErrorKind};
pub use executor::{Deliverer, DeliveryExecutor};
pub use signer::{SignatureError, sign, verify};
pub use types::DeliveryReceipt;
