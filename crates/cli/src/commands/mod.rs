pub mod ping;
pub mod sign;
pub mod verify;

use std::io::Read;
use std::path::Path;

/// Read the exact body bytes from `file`, or from stdin when absent.
pub fn read_body(file: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}
