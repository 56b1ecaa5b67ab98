//! The results file: a JSON array of discovered accounts
//!
//! The same file is read at startup as the seed list and rewritten in full
//! whenever the set of discovered accounts grows.

use crate::model::DiscoveredAccount;
use crate::storage::traits::StorageResult;
use std::path::Path;

/// Reads the results file
///
/// A missing file yields an empty list; any other IO or parse failure is an error.
pub fn load_results(path: &Path) -> StorageResult<Vec<DiscoveredAccount>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(serde_json::from_str(&content)?)
}

/// Overwrites the results file with `records`
///
/// The array is written to a sibling temp file first and renamed into place,
/// so a crash mid-write never leaves a truncated seed list behind.
pub fn save_results(path: &Path, records: &[DiscoveredAccount]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(records)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
