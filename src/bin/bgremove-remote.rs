//! Remote Background Removal CLI Tool
//!
//! Command-line frontend driving one widget session: select an image, send it
//! to the background-removal service, and save the result.

#[cfg(feature = "cli")]
use bgremove_remote::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
