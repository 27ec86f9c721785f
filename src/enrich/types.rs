use serde::{Deserialize, Serialize};

use crate::reader::types::ConnectionRecord;

/// An RGB triple. Conversions and shading live in `enrich::color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// CSS hex form, e.g. `#1a2b3c`.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// How display colors are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// One color per distinct source address.
    PerSource,
    /// One base color per (source, destination) pair, shaded per
    /// destination port in first-observed order.
    #[default]
    PerPair,
}

/// One record ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Flow {
    pub record: ConnectionRecord,
    /// `ts - min(ts)` over the filtered batch. Non-negative.
    pub relative_start: f64,
    pub color: Rgb,
}

/// The filtered, enriched render set plus its layout maxima.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedBatch {
    pub flows: Vec<Flow>,
    pub max_duration: f64,
    pub max_relative_start: f64,
}
