use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use collegia_core::{NewSubscription, TEST_EVENT, TenantId};
use collegia_dispatch::{DispatchError, DispatcherBuilder, WebhooksConfig};
use collegia_registry::{SubscriptionRegistry, SubscriptionStore};
use collegia_registry_memory::MemorySubscriptionStore;
use collegia_webhook::DeliveryReceipt;

use crate::OutputFormat;

const CLI_TENANT: &str = "cli";

#[derive(Args, Debug)]
pub struct PingArgs {
    /// Endpoint to probe.
    #[arg(long)]
    pub url: String,
    /// Shared secret; the request is unsigned when omitted.
    #[arg(long, env = "COLLEGIA_WEBHOOK_SECRET")]
    pub secret: Option<String>,
    /// Webhooks TOML config supplying timeout, user agent and header name.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Register `url` in a throwaway registry and run a test delivery against it.
pub async fn probe(args: &PingArgs) -> Result<DeliveryReceipt, DispatchError> {
    let config = match &args.config {
        Some(path) => WebhooksConfig::load(path)
            .map_err(|e| DispatchError::Configuration(e.to_string()))?,
        None => WebhooksConfig::default(),
    };

    let store: Arc<dyn SubscriptionStore> = Arc::new(MemorySubscriptionStore::new());
    let registry = SubscriptionRegistry::new(store);
    let tenant = TenantId::new(CLI_TENANT);
    let input = NewSubscription::new(&args.url, TEST_EVENT)
        .with_secret(args.secret.clone().unwrap_or_default());
    let subscription = registry.create(&tenant, input).await?;

    let dispatcher = DispatcherBuilder::new()
        .registry(registry)
        .config(&config)
        .build()?;
    let result = dispatcher.test_delivery(&tenant, &subscription.id).await;
    dispatcher.shutdown().await;
    result
}

pub async fn run(args: &PingArgs, format: &OutputFormat) -> anyhow::Result<()> {
    match probe(args).await {
        Ok(receipt) => {
            match format {
                OutputFormat::Json => {
                    let out = serde_json::json!({
                        "ok": true,
                        "status_code": receipt.status_code,
                        "elapsed_ms": receipt.elapsed.as_millis(),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                OutputFormat::Text => println!(
                    "{} answered HTTP {} in {} ms",
                    args.url,
                    receipt.status_code,
                    receipt.elapsed.as_millis()
                ),
            }
            Ok(())
        }
        Err(DispatchError::Delivery(e)) => {
            match format {
                OutputFormat::Json => {
                    let out = serde_json::json!({
                        "ok": false,
                        "kind": e.kind().as_str(),
                        "retryable": e.is_retryable(),
                        "error": e.to_string(),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                OutputFormat::Text => eprintln!("Test delivery to {} failed: {e}", args.url),
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
