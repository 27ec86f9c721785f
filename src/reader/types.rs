use serde::{Deserialize, Serialize};

use crate::error_handling::types::ParseWarning;
use crate::reader::schema::SENTINEL;

/// One parsed conn-log entry, with canonical underscore field names.
///
/// String fields keep the source token (ports included — no semantic
/// validation happens here). Optional fields hold `None` where the source
/// carried the `-` sentinel or JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub ts: f64,
    pub uid: String,
    pub id_orig_h: String,
    pub id_orig_p: String,
    pub id_resp_h: String,
    pub id_resp_p: String,
    pub proto: String,
    pub service: Option<String>,
    pub duration: Option<f64>,
    pub orig_bytes: Option<f64>,
    pub resp_bytes: Option<f64>,
    pub conn_state: String,
    pub local_orig: Option<bool>,
    pub local_resp: Option<bool>,
    pub missed_bytes: Option<f64>,
    pub history: String,
    pub orig_pkts: Option<f64>,
    pub orig_ip_bytes: Option<f64>,
    pub resp_pkts: Option<f64>,
    pub resp_ip_bytes: Option<f64>,
    pub tunnel_parents: Option<String>,
    /// UTC calendar form of `ts`, second precision. Derived, never read back.
    pub human_ts: String,
}

impl ConnectionRecord {
    /// Re-serialize the canonical fields to the 21-column tab layout.
    /// Absent values come back as the `-` sentinel. Numeric tokens come back
    /// in shortest form: source padding like `1.000000` normalizes to `1`,
    /// the same way the sentinel substitution normalizes absence.
    pub fn to_columns(&self) -> Vec<String> {
        vec![
            fmt_float(self.ts),
            self.uid.clone(),
            self.id_orig_h.clone(),
            self.id_orig_p.clone(),
            self.id_resp_h.clone(),
            self.id_resp_p.clone(),
            self.proto.clone(),
            fmt_opt_string(&self.service),
            fmt_opt_float(self.duration),
            fmt_opt_float(self.orig_bytes),
            fmt_opt_float(self.resp_bytes),
            self.conn_state.clone(),
            fmt_opt_bool(self.local_orig),
            fmt_opt_bool(self.local_resp),
            fmt_opt_float(self.missed_bytes),
            self.history.clone(),
            fmt_opt_float(self.orig_pkts),
            fmt_opt_float(self.orig_ip_bytes),
            fmt_opt_float(self.resp_pkts),
            fmt_opt_float(self.resp_ip_bytes),
            fmt_opt_string(&self.tunnel_parents),
        ]
    }
}

fn fmt_float(value: f64) -> String {
    format!("{}", value)
}

fn fmt_opt_float(value: Option<f64>) -> String {
    match value {
        Some(v) => fmt_float(v),
        None => SENTINEL.to_string(),
    }
}

fn fmt_opt_string(value: &Option<String>) -> String {
    match value {
        Some(v) => v.clone(),
        None => SENTINEL.to_string(),
    }
}

fn fmt_opt_bool(value: Option<bool>) -> String {
    match value {
        Some(true) => "T".to_string(),
        Some(false) => "F".to_string(),
        None => SENTINEL.to_string(),
    }
}

/// What to do with a record whose mandatory fields fail coercion.
/// Applied uniformly to both input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Drop the record, keep a warning on the batch, log it.
    #[default]
    Skip,
    /// Fail the whole batch with the offending line and field.
    Abort,
}

/// The ordered records parsed from one input stream, plus anything the
/// parser had to skip or truncate along the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub records: Vec<ConnectionRecord>,
    pub warnings: Vec<ParseWarning>,
}
