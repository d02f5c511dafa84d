//! Diagnostic Counter Metrics
//!
//! # Metrics Produced
//! - `pysmart_diagnostics_<field>` - One gauge per diagnostics counter
//!   - Labels: device, interface, raid_id (RAID only)
//!
//! Counters the disk does not report are exported as `-1` so every field keeps a
//! continuous series.

use super::MetricFilter;
use crate::labels::LabelSet;
use crate::metrics::MetricEmission;
use crate::smart::Diagnostics;

/// Value exported for counters the disk does not report
pub const UNAVAILABLE: f64 = -1.0;

pub fn diagnostics(
    diag: &Diagnostics,
    common: &LabelSet,
    filter: &MetricFilter,
) -> Vec<MetricEmission> {
    diag.fields()
        .into_iter()
        .filter(|(field, _)| filter.allows(field))
        .map(|(field, value)| {
            MetricEmission::gauge(
                format!("diagnostics_{}", field),
                value.unwrap_or(UNAVAILABLE),
                common.clone(),
            )
        })
        .collect()
}
