//! Writes the service's OpenAPI document, by default to `openapi.json`.
//!
//! Usage: `openapi [OUTPUT_PATH]`

use std::path::PathBuf;
use utoipa::OpenApi;
use voice_relay_api::router::ApiDoc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));
    std::fs::write(&path, ApiDoc::openapi().to_pretty_json()?)?;
    println!("OpenAPI document written to {}", path.display());
    Ok(())
}
