//! Duration filtering and timeline layout scalars.

use crate::enrich::color::{assign_colors, ColorSource};
use crate::enrich::types::{ColorMode, EnrichedBatch, Flow};
use crate::error_handling::types::EnrichError;
use crate::reader::types::ConnectionRecord;

/// Keep the records that survive the minimum-duration threshold. A record
/// with no duration at all never renders.
pub fn filter_by_duration(records: &[ConnectionRecord], min_duration: f64) -> Vec<&ConnectionRecord> {
    records
        .iter()
        .filter(|record| matches!(record.duration, Some(d) if d >= min_duration))
        .collect()
}

/// Filter a parsed batch, compute layout scalars, and assign display colors.
///
/// `relative_start` is measured from the minimum timestamp of the *filtered*
/// set, so it is non-negative for every flow. `max_duration` and
/// `max_relative_start` are the filtered-set maxima the template uses to
/// normalize bars to a 0-100% scale; an empty filtered set is `EmptyBatch`
/// rather than a downstream division by zero.
pub fn enrich(
    records: &[ConnectionRecord],
    min_duration: f64,
    mode: ColorMode,
    colors: &mut dyn ColorSource,
) -> Result<EnrichedBatch, EnrichError> {
    let survivors = filter_by_duration(records, min_duration);
    if survivors.is_empty() {
        return Err(EnrichError::EmptyBatch);
    }

    let assigned = assign_colors(&survivors, mode, colors)?;

    let min_ts = survivors.iter().map(|r| r.ts).fold(f64::INFINITY, f64::min);

    let mut flows = Vec::with_capacity(survivors.len());
    let mut max_duration = 0.0_f64;
    let mut max_relative_start = 0.0_f64;
    for (record, color) in survivors.into_iter().zip(assigned) {
        let relative_start = record.ts - min_ts;
        let duration = record.duration.unwrap_or(0.0);
        max_duration = max_duration.max(duration);
        max_relative_start = max_relative_start.max(relative_start);
        flows.push(Flow {
            record: record.clone(),
            relative_start,
            color,
        });
    }

    Ok(EnrichedBatch {
        flows,
        max_duration,
        max_relative_start,
    })
}
