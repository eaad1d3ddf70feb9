//! Sentinel-aware numeric coercion.
//!
//! Vendor exports mix genuine readings with placeholder tokens meaning
//! "no sample". Coercion maps those tokens, unparseable strings and
//! non-finite results to missing; it never errors and never substitutes
//! zero.

use serde::{Deserialize, Serialize};

/// Vendor sentinel tokens meaning "no sample".
///
/// This exact set is part of the public contract and must be reproduced
/// for compatibility with existing exports.
pub const DEFAULT_SENTINELS: [&str; 5] = ["NS", "-99.95", "-99.9", "-40.0", ""];

/// Configuration for numeric coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionConfig {
    /// Tokens mapped to missing before any numeric parse is attempted.
    pub sentinels: Vec<String>,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            sentinels: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CoercionConfig {
    fn is_sentinel(&self, token: &str) -> bool {
        self.sentinels.iter().any(|s| s == token)
    }
}

/// Coerce one raw textual field to a finite float, or missing.
///
/// The token is trimmed first; sentinel matching is exact on the trimmed
/// token.
pub fn coerce_value(raw: &str, config: &CoercionConfig) -> Option<f64> {
    let token = raw.trim();
    if config.is_sentinel(token) {
        return None;
    }
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}
