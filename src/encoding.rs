// 🎯 Categorical Encoder - Target Encoding Lookup
// Maps high-cardinality categorical values (car model, RTO state) to
// precomputed target-encoding statistics with a global-mean fallback

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// ENCODING TABLE
// ============================================================================

/// Immutable mapping from a categorical value to its target-encoding
/// statistic, produced by the offline training job and loaded read-only.
///
/// Lookup is total: a value either hits a stored key or resolves to the
/// fallback (the global mean over the training population). The fallback is
/// itself a precomputed constant, never recomputed per call.
#[derive(Debug, Clone)]
pub struct EncodingTable {
    stats: HashMap<String, f64>,
    fallback: f64,
}

impl EncodingTable {
    pub fn new(stats: HashMap<String, f64>, fallback: f64) -> Self {
        EncodingTable { stats, fallback }
    }

    /// Load a table from its JSON artifact (flat `{"value": statistic}`
    /// object) plus the shared global-mean artifact (a bare JSON number).
    pub fn from_files<P: AsRef<Path>>(table_path: P, global_mean_path: P) -> Result<Self> {
        let table_json = fs::read_to_string(table_path.as_ref())
            .with_context(|| format!("Failed to read encoding table: {:?}", table_path.as_ref()))?;
        let stats: HashMap<String, f64> = serde_json::from_str(&table_json)
            .context("Failed to parse encoding table JSON")?;

        let mean_json = fs::read_to_string(global_mean_path.as_ref()).with_context(|| {
            format!("Failed to read global mean: {:?}", global_mean_path.as_ref())
        })?;
        let fallback: f64 =
            serde_json::from_str(&mean_json).context("Failed to parse global mean JSON")?;

        Ok(EncodingTable::new(stats, fallback))
    }

    /// Encode a categorical value. Returns the stored statistic for known
    /// values and the global-mean fallback for everything else. Total over
    /// all possible strings; never fails. Unseen values are expected here,
    /// not an error: free-text "Other (Not Listed)" input is supported
    /// upstream.
    pub fn encode(&self, value: &str) -> f64 {
        match self.stats.get(value) {
            Some(stat) => *stat,
            None => self.fallback,
        }
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
