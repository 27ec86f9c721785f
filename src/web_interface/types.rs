use serde::Serialize;

use crate::enrich::types::{ColorMode, EnrichedBatch, Flow};
use crate::reader::source::LogSource;
use crate::reader::types::MalformedPolicy;

/// Everything a render request needs. Shared across requests behind an
/// `Arc`; only the one-shot stdin flag inside `LogSource` is ever mutated.
#[derive(Debug)]
pub struct AppState {
    pub source: LogSource,
    pub min_duration: f64,
    pub color_mode: ColorMode,
    pub policy: MalformedPolicy,
}

/// One flow, flattened for the template: display strings, percentages for
/// bar position/width, and contrast-aware colors.
#[derive(Debug, Serialize)]
pub struct FlowView {
    pub human_ts: String,
    pub uid: String,
    pub id_orig_h: String,
    pub id_orig_p: String,
    pub id_resp_h: String,
    pub id_resp_p: String,
    pub proto: String,
    pub service: String,
    pub duration: f64,
    pub relative_start: f64,
    pub left_pct: f64,
    pub width_pct: f64,
    pub color: String,
    pub text_color: String,
}

#[derive(Debug, Serialize)]
pub struct TimelineContext {
    pub flows: Vec<FlowView>,
    pub max_duration: f64,
    pub max_relative_start: f64,
}

impl TimelineContext {
    pub fn from_batch(batch: &EnrichedBatch) -> Self {
        TimelineContext {
            flows: batch
                .flows
                .iter()
                .map(|flow| FlowView::from_flow(flow, batch.max_duration, batch.max_relative_start))
                .collect(),
            max_duration: batch.max_duration,
            max_relative_start: batch.max_relative_start,
        }
    }
}

impl FlowView {
    fn from_flow(flow: &Flow, max_duration: f64, max_relative_start: f64) -> Self {
        let record = &flow.record;
        let duration = record.duration.unwrap_or(0.0);
        FlowView {
            human_ts: record.human_ts.clone(),
            uid: record.uid.clone(),
            id_orig_h: record.id_orig_h.clone(),
            id_orig_p: record.id_orig_p.clone(),
            id_resp_h: record.id_resp_h.clone(),
            id_resp_p: record.id_resp_p.clone(),
            proto: record.proto.clone(),
            service: record.service.clone().unwrap_or_else(|| "-".to_string()),
            duration,
            relative_start: flow.relative_start,
            left_pct: pct(flow.relative_start, max_relative_start),
            width_pct: pct(duration, max_duration),
            color: flow.color.hex(),
            text_color: if flow.color.is_dark() {
                "#ffffff".to_string()
            } else {
                "#000000".to_string()
            },
        }
    }
}

/// Position on a 0-100% scale. A zero maximum (single-instant batch) pins
/// everything to zero instead of dividing by it.
fn pct(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_guards_zero_maximum() {
        assert_eq!(pct(0.0, 0.0), 0.0);
        assert_eq!(pct(3.0, 6.0), 50.0);
        assert_eq!(pct(6.0, 6.0), 100.0);
    }
}
