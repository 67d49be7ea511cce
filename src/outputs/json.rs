//! Persisting the collection document.

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::NewsCollection;

/// File name of the persisted collection inside the output directory.
pub const COLLECTION_FILE: &str = "news.json";

/// Write the collection to `<output_dir>/news.json`.
///
/// The document is written to a sibling temp file and renamed over the
/// final path, so readers never observe a partial or interleaved document.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_collection(
    collection: &NewsCollection,
    output_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let body = serde_json::to_string_pretty(collection)?;

    fs::create_dir_all(output_dir).await?;
    let final_path = Path::new(output_dir).join(COLLECTION_FILE);
    // rename is atomic because the temp file shares the target directory
    let temp_path = Path::new(output_dir).join(format!("{COLLECTION_FILE}.tmp"));
    fs::write(&temp_path, format!("{body}\n")).await?;
    fs::rename(&temp_path, &final_path).await?;

    info!(path = %final_path.display(), total = collection.total, "wrote collection document");
    Ok(())
}
