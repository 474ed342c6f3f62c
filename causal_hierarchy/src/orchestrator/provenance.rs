//! Reproducibility fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::HierarchyParams;
use crate::error::HierarchyResult;

/// Engine identifier recorded with every output.
pub const KERNEL_VERSION: &str = concat!("causal_hierarchy/", env!("CARGO_PKG_VERSION"));

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Which engine and parameters produced an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub kernel_version: String,
    /// Canonical JSON rendering of the full parameter set.
    pub params_json: String,
    pub param_hash: String,
}

impl Provenance {
    pub fn from_params(params: &HierarchyParams) -> HierarchyResult<Self> {
        let params_json = params.to_canonical_json()?;
        Ok(Self {
            kernel_version: KERNEL_VERSION.to_string(),
            param_hash: sha256_hex(params_json.as_bytes()),
            params_json,
        })
    }
}
