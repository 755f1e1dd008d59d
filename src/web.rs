#![cfg(not(tarpaulin_include))]

use droptrack::app;

/// Main entry point for the web application
///
/// Initializes and runs the web server for the airdrop tracker.
///
/// # Default Configuration
/// * Listens on port 3000; override with the `PORT` environment variable
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    // Start the web application
    app::run(port).await
}
