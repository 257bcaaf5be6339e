use std::path::PathBuf;

use clap::Args;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Shared subscription secret.
    #[arg(long, env = "COLLEGIA_WEBHOOK_SECRET")]
    pub secret: String,
    /// Value of the received signature header.
    #[arg(long)]
    pub signature: String,
    /// File containing the received body. Reads stdin when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn run(args: &VerifyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let body = super::read_body(args.file.as_deref())?;
    let valid = collegia_webhook::verify(&args.secret, &body, &args.signature);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "valid": valid }));
        }
        OutputFormat::Text if valid => println!("Signature is valid."),
        OutputFormat::Text => eprintln!("Signature does not match."),
    }

    if !valid {
        std::process::exit(1);
    }
    Ok(())
}
