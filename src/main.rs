//! lumea_release - release tooling for Lumea.
//!
//! This binary builds self-contained Lumea executables and runs the release
//! chores around them (version guard, artifact collection, postinstall download).

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match lumea_release::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
