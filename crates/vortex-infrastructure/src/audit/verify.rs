//! Audit chain verification tooling.

use std::path::Path;

use vortex_domain::constants::audit::GENESIS_HASH;
use vortex_domain::entities::ChainedEntry;
use vortex_domain::error::{Error, Result};

/// Verify a chain file end to end.
///
/// Checks every record's own hash and the linkage between consecutive
/// records, starting from the genesis hash. Returns the number of verified
/// records.
///
/// # Errors
/// Returns an error naming the first offending line.
pub fn verify_chain_file(path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::io_with_source(format!("read chain file '{}'", path.display()), e))?;

    let mut prev_hash = GENESIS_HASH.to_owned();
    let mut verified = 0usize;

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: ChainedEntry = serde_json::from_str(line).map_err(|e| {
            Error::invalid_request(format!("line {}: malformed audit record: {e}", line_no + 1))
        })?;

        if record.prev_hash != prev_hash {
            return Err(Error::invalid_request(format!(
                "line {}: chain break (expected prev_hash {prev_hash}, found {})",
                line_no + 1,
                record.prev_hash
            )));
        }
        if !record.is_consistent() {
            return Err(Error::invalid_request(format!(
                "line {}: hash mismatch",
                line_no + 1
            )));
        }

        prev_hash = record.hash.clone();
        verified += 1;
    }

    Ok(verified)
}
