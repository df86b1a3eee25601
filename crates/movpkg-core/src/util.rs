//! Run identifiers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Generate a run identifier like `run_0123456789abcdef`.
///
/// Mixes the clock, the process id and a per-process counter, so two runs
/// started in the same nanosecond still differ.
pub fn generate_run_id() -> String {
    static RUNS: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64);
    let digest = Sha256::new()
        .chain_update(nanos.to_le_bytes())
        .chain_update(std::process::id().to_le_bytes())
        .chain_update(RUNS.fetch_add(1, Ordering::Relaxed).to_le_bytes())
        .finalize();
    format!("run_{}", hex::encode(&digest[..8]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn run_ids_are_unique() {
        let ids: HashSet<_> = (0..500).map(|_| generate_run_id()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn run_id_format() {
        let id = generate_run_id();
        assert!(id.starts_with("run_"), "unexpected run id: {id}");
        assert_eq!(id.len(), 20);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
