//! Kodegen Bundler Extension - packages Flutter web builds as Chrome extensions.
//!
//! This binary builds a Flutter project (or composes several) into an
//! unpacked extension directory ready for "Load unpacked".

use std::process;

use kodegen_bundler_extension::cli;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
