//! Log reading subsystem
//!
//! Turns a conn-log byte stream into an ordered batch of typed records.
//!
//! Components:
//! - `schema`: the fixed 21-column schema and field-name normalization.
//! - `source`: file vs one-shot stdin input abstraction.
//! - `parse`: format detection, row parsing, and type coercion.
//! - `types`: the `ConnectionRecord` and batch types.

pub mod parse;
pub mod schema;
pub mod source;
pub mod types;

pub use parse::read_conn_log;
pub use source::LogSource;
pub use types::{ConnectionRecord, MalformedPolicy, ParsedBatch};
