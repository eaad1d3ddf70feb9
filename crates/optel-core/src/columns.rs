//! Canonical KPI to source-column resolution.
//!
//! Vendor CSV exports name the same KPI differently across firmware
//! generations. The map below carries the known variants per canonical
//! KPI; resolution picks the first variant present in the dataset.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Canonical KPI names to likely source-column variants, in preference
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiColumnMap {
    variants: BTreeMap<String, Vec<String>>,
}

impl Default for KpiColumnMap {
    fn default() -> Self {
        let mut variants = BTreeMap::new();
        let table: [(&str, &[&str]); 6] = [
            ("osnr", &["ESNR-AVG", "ESNR_AVG", "OSNR", "OSNR-AVG"]),
            ("pre_fec_ber", &["PREFEC-AVG", "PRE-FEC", "PRE-FEC-AVG"]),
            ("post_fec_ber", &["POST-FEC", "POSTFEC"]),
            ("qfactor", &["QFACTOR-AVG", "QFACTOR", "QFACTOR_AVG"]),
            ("cd", &["CDR", "CDR-AVG", "CD"]),
            ("rx_power", &["OPR-AVG", "TOPR-AVG", "TOPT-AVG", "TOPRL-AVG"]),
        ];
        for (kpi, cols) in table {
            variants.insert(
                kpi.to_string(),
                cols.iter().map(|c| c.to_string()).collect(),
            );
        }
        Self { variants }
    }
}

impl KpiColumnMap {
    /// A map with no entries; populate with [`KpiColumnMap::with_variants`].
    pub fn empty() -> Self {
        Self {
            variants: BTreeMap::new(),
        }
    }

    /// Add or replace the variant list for one canonical KPI.
    pub fn with_variants(
        mut self,
        kpi: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.variants
            .insert(kpi.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Canonical KPI names known to this map.
    pub fn kpis(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }

    /// Resolve a canonical KPI to the first variant present in `columns`.
    pub fn resolve<'a>(&'a self, kpi: &str, columns: &BTreeSet<String>) -> Option<&'a str> {
        self.variants
            .get(kpi)?
            .iter()
            .find(|c| columns.contains(c.as_str()))
            .map(String::as_str)
    }
}
