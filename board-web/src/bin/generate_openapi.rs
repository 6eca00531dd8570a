//! Generate the OpenAPI specification file
//!
//! Writes `board-web/docs/openapi.json` for client generators and reviewers.

use board_web::openapi::get_openapi_json;
use std::fs;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating OpenAPI specification...");

    let docs_dir = Path::new("board-web/docs");
    if !docs_dir.exists() {
        fs::create_dir_all(docs_dir)?;
    }

    let json_path = docs_dir.join("openapi.json");
    fs::write(&json_path, get_openapi_json()?)?;
    println!("Generated: {}", json_path.display());

    Ok(())
}
