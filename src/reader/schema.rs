//! The fixed Zeek conn-log schema and field-name normalization.

/// Number of columns in a conn log row.
pub const SCHEMA_WIDTH: usize = 21;

/// Placeholder token for a field intentionally absent in the source format.
pub const SENTINEL: &str = "-";

/// Canonical (underscore) column names, in on-disk order.
pub const COLUMNS: [&str; SCHEMA_WIDTH] = [
    "ts",
    "uid",
    "id_orig_h",
    "id_orig_p",
    "id_resp_h",
    "id_resp_p",
    "proto",
    "service",
    "duration",
    "orig_bytes",
    "resp_bytes",
    "conn_state",
    "local_orig",
    "local_resp",
    "missed_bytes",
    "history",
    "orig_pkts",
    "orig_ip_bytes",
    "resp_pkts",
    "resp_ip_bytes",
    "tunnel_parents",
];

/// Dotted spellings of the four endpoint fields, as written by Zeek's JSON
/// writer and by the tab-format header line.
const DOTTED_ENDPOINTS: [(&str, &str); 4] = [
    ("id.orig_h", "id_orig_h"),
    ("id.orig_p", "id_orig_p"),
    ("id.resp_h", "id_resp_h"),
    ("id.resp_p", "id_resp_p"),
];

/// Resolve a field name, dotted or underscore, to its canonical underscore
/// form. Total over the schema: every spelling of every schema field maps,
/// anything else is `None`.
pub fn canonical_name(name: &str) -> Option<&'static str> {
    if let Some((_, canonical)) = DOTTED_ENDPOINTS.iter().find(|(dotted, _)| *dotted == name) {
        return Some(canonical);
    }
    COLUMNS.iter().find(|c| **c == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_map_to_themselves() {
        for column in COLUMNS {
            assert_eq!(canonical_name(column), Some(column));
        }
    }

    #[test]
    fn dotted_endpoint_names_normalize() {
        assert_eq!(canonical_name("id.orig_h"), Some("id_orig_h"));
        assert_eq!(canonical_name("id.orig_p"), Some("id_orig_p"));
        assert_eq!(canonical_name("id.resp_h"), Some("id_resp_h"));
        assert_eq!(canonical_name("id.resp_p"), Some("id_resp_p"));
    }

    #[test]
    fn unknown_names_do_not_resolve() {
        assert_eq!(canonical_name("id.orig"), None);
        assert_eq!(canonical_name("bytes"), None);
        assert_eq!(canonical_name(""), None);
    }
}
