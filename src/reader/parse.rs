//! Conn-log parsing: format detection, row parsing, type coercion.
//!
//! Two source formats are accepted, detected from the first non-empty line:
//! whitespace-separated 21-column rows (`#`-prefixed lines skipped), or one
//! JSON object per line with dotted field names. Both normalize to the same
//! `ConnectionRecord`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value;

use crate::error_handling::types::{ParseWarning, ReaderError};
use crate::reader::schema::{self, SCHEMA_WIDTH, SENTINEL};
use crate::reader::types::{ConnectionRecord, MalformedPolicy, ParsedBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Tabular,
    JsonLines,
}

/// A mandatory or present field that failed coercion. The caller attaches
/// the line number and raw text.
struct Malformed {
    field: &'static str,
}

/// Parse a whole input stream into an ordered batch of records.
///
/// Malformed records are handled per `policy`: skipped with a warning on the
/// batch (and `log::warn!`), or aborting the batch. The policy applies
/// identically to both formats.
pub fn read_conn_log(input: &str, policy: MalformedPolicy) -> Result<ParsedBatch, ReaderError> {
    let format = detect_format(input).ok_or(ReaderError::EmptyInput)?;

    let mut batch = ParsedBatch::default();
    let mut saw_data = false;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if format == Format::Tabular && line.starts_with('#') {
            continue;
        }
        saw_data = true;

        let parsed = match format {
            Format::Tabular => parse_tabular_line(line, line_no, &mut batch.warnings),
            Format::JsonLines => parse_json_line(line),
        };
        match parsed {
            Ok(record) => batch.records.push(record),
            Err(Malformed { field }) => match policy {
                MalformedPolicy::Abort => {
                    return Err(ReaderError::MalformedRecord {
                        line_no,
                        field,
                        raw: line.to_string(),
                    })
                }
                MalformedPolicy::Skip => {
                    let warning = ParseWarning::MalformedRecord {
                        line_no,
                        field,
                        raw: line.to_string(),
                    };
                    warn!("{}", warning);
                    batch.warnings.push(warning);
                }
            },
        }
    }

    if !saw_data {
        return Err(ReaderError::EmptyInput);
    }
    Ok(batch)
}

fn detect_format(input: &str) -> Option<Format> {
    let first = input.lines().map(str::trim).find(|line| !line.is_empty())?;
    if first.starts_with('{') {
        Some(Format::JsonLines)
    } else {
        Some(Format::Tabular)
    }
}

/// UTC calendar form of an epoch timestamp, second precision.
/// `None` when the timestamp is not representable.
pub fn human_timestamp(ts: f64) -> Option<String> {
    if !ts.is_finite() {
        return None;
    }
    let dt = DateTime::<Utc>::from_timestamp(ts.floor() as i64, 0)?;
    Some(dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn parse_tabular_line(
    line: &str,
    line_no: usize,
    warnings: &mut Vec<ParseWarning>,
) -> Result<ConnectionRecord, Malformed> {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.len() > SCHEMA_WIDTH {
        let warning = ParseWarning::TruncatedLine {
            line_no,
            expected: SCHEMA_WIDTH,
            got: tokens.len(),
        };
        warn!("{}", warning);
        warnings.push(warning);
        tokens.truncate(SCHEMA_WIDTH);
    }
    while tokens.len() < SCHEMA_WIDTH {
        tokens.push(SENTINEL);
    }

    let ts = req_float("ts", tokens[0])?;
    let human_ts = human_timestamp(ts).ok_or(Malformed { field: "ts" })?;

    Ok(ConnectionRecord {
        ts,
        uid: tokens[1].to_string(),
        id_orig_h: tokens[2].to_string(),
        id_orig_p: tokens[3].to_string(),
        id_resp_h: tokens[4].to_string(),
        id_resp_p: tokens[5].to_string(),
        proto: tokens[6].to_string(),
        service: opt_string(tokens[7]),
        duration: opt_float("duration", tokens[8])?,
        orig_bytes: opt_float("orig_bytes", tokens[9])?,
        resp_bytes: opt_float("resp_bytes", tokens[10])?,
        conn_state: tokens[11].to_string(),
        local_orig: opt_bool("local_orig", tokens[12])?,
        local_resp: opt_bool("local_resp", tokens[13])?,
        missed_bytes: opt_float("missed_bytes", tokens[14])?,
        history: tokens[15].to_string(),
        orig_pkts: opt_float("orig_pkts", tokens[16])?,
        orig_ip_bytes: opt_float("orig_ip_bytes", tokens[17])?,
        resp_pkts: opt_float("resp_pkts", tokens[18])?,
        resp_ip_bytes: opt_float("resp_ip_bytes", tokens[19])?,
        tunnel_parents: opt_string(tokens[20]),
        human_ts,
    })
}

fn req_float(field: &'static str, token: &str) -> Result<f64, Malformed> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(Malformed { field })
}

fn opt_float(field: &'static str, token: &str) -> Result<Option<f64>, Malformed> {
    if token == SENTINEL {
        return Ok(None);
    }
    req_float(field, token).map(Some)
}

fn opt_string(token: &str) -> Option<String> {
    if token == SENTINEL {
        None
    } else {
        Some(token.to_string())
    }
}

fn opt_bool(field: &'static str, token: &str) -> Result<Option<bool>, Malformed> {
    match token {
        "T" | "true" => Ok(Some(true)),
        "F" | "false" => Ok(Some(false)),
        SENTINEL => Ok(None),
        _ => Err(Malformed { field }),
    }
}

fn parse_json_line(line: &str) -> Result<ConnectionRecord, Malformed> {
    let value: Value = serde_json::from_str(line).map_err(|_| Malformed { field: "record" })?;
    let object = value.as_object().ok_or(Malformed { field: "record" })?;

    // Normalize keys up front so dotted and underscore spellings land on the
    // same canonical name. Unknown keys are ignored.
    let mut fields: HashMap<&'static str, &Value> = HashMap::new();
    for (key, val) in object {
        if let Some(canonical) = schema::canonical_name(key) {
            fields.insert(canonical, val);
        }
    }

    let ts = json_req_float(&fields, "ts")?;
    let human_ts = human_timestamp(ts).ok_or(Malformed { field: "ts" })?;

    Ok(ConnectionRecord {
        ts,
        uid: json_string(&fields, "uid"),
        id_orig_h: json_string(&fields, "id_orig_h"),
        id_orig_p: json_string(&fields, "id_orig_p"),
        id_resp_h: json_string(&fields, "id_resp_h"),
        id_resp_p: json_string(&fields, "id_resp_p"),
        proto: json_string(&fields, "proto"),
        service: json_opt_string(&fields, "service"),
        duration: json_opt_float(&fields, "duration")?,
        orig_bytes: json_opt_float(&fields, "orig_bytes")?,
        resp_bytes: json_opt_float(&fields, "resp_bytes")?,
        conn_state: json_string(&fields, "conn_state"),
        local_orig: json_opt_bool(&fields, "local_orig")?,
        local_resp: json_opt_bool(&fields, "local_resp")?,
        missed_bytes: json_opt_float(&fields, "missed_bytes")?,
        history: json_string(&fields, "history"),
        orig_pkts: json_opt_float(&fields, "orig_pkts")?,
        orig_ip_bytes: json_opt_float(&fields, "orig_ip_bytes")?,
        resp_pkts: json_opt_float(&fields, "resp_pkts")?,
        resp_ip_bytes: json_opt_float(&fields, "resp_ip_bytes")?,
        tunnel_parents: json_opt_string(&fields, "tunnel_parents"),
        human_ts,
    })
}

/// String field: missing and `null` come back as the sentinel so the record
/// keeps the same shape as the tab format. Zeek writes ports as numbers.
fn json_string(fields: &HashMap<&'static str, &Value>, key: &'static str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => SENTINEL.to_string(),
    }
}

fn json_opt_string(fields: &HashMap<&'static str, &Value>, key: &'static str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(s)) if s != SENTINEL => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn float_value(field: &'static str, value: &Value) -> Result<f64, Malformed> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).ok_or(Malformed { field }),
        Value::String(s) => req_float(field, s),
        _ => Err(Malformed { field }),
    }
}

fn json_req_float(
    fields: &HashMap<&'static str, &Value>,
    key: &'static str,
) -> Result<f64, Malformed> {
    let value = fields.get(key).ok_or(Malformed { field: key })?;
    float_value(key, value)
}

fn json_opt_float(
    fields: &HashMap<&'static str, &Value>,
    key: &'static str,
) -> Result<Option<f64>, Malformed> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s == SENTINEL => Ok(None),
        Some(value) => float_value(key, value).map(Some),
    }
}

fn json_opt_bool(
    fields: &HashMap<&'static str, &Value>,
    key: &'static str,
) -> Result<Option<bool>, Malformed> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => opt_bool(key, s),
        _ => Err(Malformed { field: key }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_LINE: &str =
        "100.5 C1 10.0.0.1 50000 10.0.0.2 80 tcp http 5.25 100 200 SF T F 0 ShADad 4 300 5 400 -";

    #[test]
    fn parses_full_tabular_line() {
        let batch = read_conn_log(FULL_LINE, MalformedPolicy::Abort).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert!(batch.warnings.is_empty());

        let record = &batch.records[0];
        assert_eq!(record.ts, 100.5);
        assert_eq!(record.uid, "C1");
        assert_eq!(record.id_orig_h, "10.0.0.1");
        assert_eq!(record.id_orig_p, "50000");
        assert_eq!(record.id_resp_h, "10.0.0.2");
        assert_eq!(record.id_resp_p, "80");
        assert_eq!(record.proto, "tcp");
        assert_eq!(record.service.as_deref(), Some("http"));
        assert_eq!(record.duration, Some(5.25));
        assert_eq!(record.orig_bytes, Some(100.0));
        assert_eq!(record.local_orig, Some(true));
        assert_eq!(record.local_resp, Some(false));
        assert_eq!(record.history, "ShADad");
        assert_eq!(record.tunnel_parents, None);
    }

    #[test]
    fn tabular_round_trips_to_columns() {
        let batch = read_conn_log(FULL_LINE, MalformedPolicy::Abort).unwrap();
        let expected: Vec<&str> = FULL_LINE.split_whitespace().collect();
        assert_eq!(batch.records[0].to_columns(), expected);
    }

    #[test]
    fn to_columns_normalizes_padded_decimals() {
        // Zeek pads durations to six decimals; re-serialization uses the
        // shortest form, like the sentinel normalization.
        let line = "100.5 C1 10.0.0.1 1 10.0.0.2 2 tcp - 1.000000 2.500000 - S0 - - 0 S 1 1 1 1 -";
        let batch = read_conn_log(line, MalformedPolicy::Abort).unwrap();
        let columns = batch.records[0].to_columns();
        assert_eq!(columns[8], "1");
        assert_eq!(columns[9], "2.5");
    }

    #[test]
    fn short_line_is_padded_with_sentinels() {
        // 18 of 21 fields: orig_pkts onwards missing.
        let line = "100.5 C1 10.0.0.1 50000 10.0.0.2 80 tcp http 5.25 100 200 SF T F 0 ShADad 4 300";
        let batch = read_conn_log(line, MalformedPolicy::Abort).unwrap();
        let record = &batch.records[0];
        assert_eq!(record.resp_pkts, None);
        assert_eq!(record.resp_ip_bytes, None);
        assert_eq!(record.tunnel_parents, None);
        assert!(batch.warnings.is_empty());
    }

    #[test]
    fn overlong_line_is_truncated_with_warning() {
        let line = format!("{} extra1 extra2", FULL_LINE);
        let batch = read_conn_log(&line, MalformedPolicy::Abort).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(
            batch.warnings,
            vec![crate::error_handling::types::ParseWarning::TruncatedLine {
                line_no: 1,
                expected: SCHEMA_WIDTH,
                got: 23,
            }]
        );
        // The surviving fields are unaffected by the dropped tail.
        assert_eq!(batch.records[0].tunnel_parents, None);
    }

    #[test]
    fn comment_and_blank_lines_are_skipped() {
        let input = format!("#separator \\x09\n#fields ts uid\n\n{}\n", FULL_LINE);
        let batch = read_conn_log(&input, MalformedPolicy::Abort).unwrap();
        assert_eq!(batch.records.len(), 1);
    }

    #[test]
    fn empty_input_is_signaled() {
        assert!(matches!(
            read_conn_log("", MalformedPolicy::Skip),
            Err(ReaderError::EmptyInput)
        ));
        assert!(matches!(
            read_conn_log("\n  \n", MalformedPolicy::Skip),
            Err(ReaderError::EmptyInput)
        ));
        assert!(matches!(
            read_conn_log("#fields ts uid\n#types time string\n", MalformedPolicy::Skip),
            Err(ReaderError::EmptyInput)
        ));
    }

    #[test]
    fn malformed_ts_skips_under_skip_policy() {
        let input = format!("bogus C1 10.0.0.1 1 10.0.0.2 2 tcp - 1 - - S0 - - 0 S 1 1 1 1 -\n{}", FULL_LINE);
        let batch = read_conn_log(&input, MalformedPolicy::Skip).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.warnings.len(), 1);
        assert!(matches!(
            batch.warnings[0],
            ParseWarning::MalformedRecord { line_no: 1, field: "ts", .. }
        ));
    }

    #[test]
    fn malformed_ts_aborts_under_abort_policy() {
        let input = format!("{}\nbogus C1 10.0.0.1 1 10.0.0.2 2 tcp - 1 - - S0 - - 0 S 1 1 1 1 -", FULL_LINE);
        match read_conn_log(&input, MalformedPolicy::Abort) {
            Err(ReaderError::MalformedRecord { line_no, field, .. }) => {
                assert_eq!(line_no, 2);
                assert_eq!(field, "ts");
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn malformed_duration_is_a_coercion_failure() {
        let line = "100.5 C1 10.0.0.1 1 10.0.0.2 2 tcp - oops - - S0 - - 0 S 1 1 1 1 -";
        match read_conn_log(line, MalformedPolicy::Abort) {
            Err(ReaderError::MalformedRecord { field, .. }) => assert_eq!(field, "duration"),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn sentinel_duration_is_absent_not_malformed() {
        let line = "100.5 C1 10.0.0.1 1 10.0.0.2 2 tcp - - - - S0 - - 0 S 1 1 1 1 -";
        let batch = read_conn_log(line, MalformedPolicy::Abort).unwrap();
        assert_eq!(batch.records[0].duration, None);
    }

    #[test]
    fn parses_json_lines_with_dotted_names() {
        let input = concat!(
            r#"{"ts": 100.5, "uid": "C1", "id.orig_h": "10.0.0.1", "id.orig_p": 50000, "#,
            r#""id.resp_h": "10.0.0.2", "id.resp_p": 80, "proto": "tcp", "service": "http", "#,
            r#""duration": 5.25, "orig_bytes": 100, "resp_bytes": 200, "conn_state": "SF", "#,
            r#""local_orig": true, "local_resp": false, "missed_bytes": 0, "history": "ShADad", "#,
            r#""orig_pkts": 4, "orig_ip_bytes": 300, "resp_pkts": 5, "resp_ip_bytes": 400}"#,
        );
        let batch = read_conn_log(input, MalformedPolicy::Abort).unwrap();
        let record = &batch.records[0];
        assert_eq!(record.ts, 100.5);
        assert_eq!(record.id_orig_h, "10.0.0.1");
        assert_eq!(record.id_orig_p, "50000");
        assert_eq!(record.id_resp_p, "80");
        assert_eq!(record.duration, Some(5.25));
        assert_eq!(record.local_orig, Some(true));
        assert_eq!(record.tunnel_parents, None);
    }

    #[test]
    fn json_null_duration_is_absent() {
        let input = r#"{"ts": 100.0, "uid": "C1", "duration": null}"#;
        let batch = read_conn_log(input, MalformedPolicy::Abort).unwrap();
        assert_eq!(batch.records[0].duration, None);
        assert_eq!(batch.records[0].proto, "-");
    }

    #[test]
    fn json_missing_ts_is_malformed() {
        let input = r#"{"uid": "C1", "duration": 1.0}"#;
        match read_conn_log(input, MalformedPolicy::Abort) {
            Err(ReaderError::MalformedRecord { field, .. }) => assert_eq!(field, "ts"),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn human_timestamp_is_a_pure_function_of_ts() {
        assert_eq!(human_timestamp(0.0).unwrap(), "1970-01-01 00:00:00");
        assert_eq!(human_timestamp(100.5).unwrap(), "1970-01-01 00:01:40");

        let tab = read_conn_log(FULL_LINE, MalformedPolicy::Abort).unwrap();
        let json = read_conn_log(r#"{"ts": 100.5}"#, MalformedPolicy::Abort).unwrap();
        assert_eq!(tab.records[0].human_ts, json.records[0].human_ts);
    }
}
