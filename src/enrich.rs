//! Display enrichment subsystem
//!
//! Takes a parsed batch and derives everything the timeline needs:
//! duration filtering, relative start offsets, layout maxima, and per-group
//! color assignment.

pub mod color;
pub mod layout;
pub mod types;

pub use color::{ColorSource, RandomColors};
pub use layout::enrich;
pub use types::{ColorMode, EnrichedBatch, Flow, Rgb};
