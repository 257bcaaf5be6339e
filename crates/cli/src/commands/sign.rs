use std::path::PathBuf;

use clap::Args;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Shared subscription secret.
    #[arg(long, env = "COLLEGIA_WEBHOOK_SECRET")]
    pub secret: String,
    /// File containing the body. Reads stdin when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn run(args: &SignArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let body = super::read_body(args.file.as_deref())?;
    let signature = collegia_webhook::sign(&args.secret, &body)?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "signature": signature,
                "bytes": body.len(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!("{signature}"),
    }
    Ok(())
}
