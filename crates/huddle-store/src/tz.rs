//! Timezone abbreviation table. Each abbreviation maps to a fixed UTC
//! offset — no DST resolution; "PST" always means -08:00.

use chrono::FixedOffset;

/// Known abbreviations and their offsets in seconds east of UTC.
pub const KNOWN_TIMEZONES: &[(&str, i32)] = &[
    ("UTC", 0),
    ("GMT", 0),
    // Americas
    ("NST", -(3 * 3600 + 1800)),
    ("ADT", -3 * 3600),
    ("AST", -4 * 3600),
    ("AMT", -4 * 3600),
    ("EDT", -4 * 3600),
    ("EST", -5 * 3600),
    ("CDT", -5 * 3600),
    ("CST", -6 * 3600),
    ("MDT", -6 * 3600),
    ("MST", -7 * 3600),
    ("PDT", -7 * 3600),
    ("PST", -8 * 3600),
    ("AKST", -9 * 3600),
    ("HST", -10 * 3600),
    ("ART", -3 * 3600),
    ("BRT", -3 * 3600),
    // Europe / Africa
    ("WET", 0),
    ("BST", 3600),
    ("CET", 3600),
    ("WAT", 3600),
    ("CEST", 2 * 3600),
    ("EET", 2 * 3600),
    ("SAST", 2 * 3600),
    ("EEST", 3 * 3600),
    ("MSK", 3 * 3600),
    ("EAT", 3 * 3600),
    // Asia / Oceania
    ("GST", 4 * 3600),
    ("PKT", 5 * 3600),
    ("IST", 5 * 3600 + 1800),
    ("BTT", 6 * 3600),
    ("ICT", 7 * 3600),
    ("SGT", 8 * 3600),
    ("HKT", 8 * 3600),
    ("AWST", 8 * 3600),
    ("JST", 9 * 3600),
    ("KST", 9 * 3600),
    ("ACST", 9 * 3600 + 1800),
    ("AEST", 10 * 3600),
    ("AEDT", 11 * 3600),
    ("NZST", 12 * 3600),
    ("NZDT", 13 * 3600),
];

/// Whether the abbreviation is in the table (case-insensitive).
pub fn is_known(abbr: &str) -> bool {
    offset_for(abbr).is_some()
}

/// Fixed offset for an abbreviation (case-insensitive).
pub fn offset_for(abbr: &str) -> Option<FixedOffset> {
    let upper = abbr.to_uppercase();
    KNOWN_TIMEZONES
        .iter()
        .find(|(name, _)| *name == upper)
        .and_then(|(_, secs)| FixedOffset::east_opt(*secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_abbreviations() {
        assert!(is_known("AMT"));
        assert!(is_known("pst"));
        assert!(is_known("UTC"));
        assert!(!is_known("XXXXZZ"));
        assert!(!is_known(""));
    }

    #[test]
    fn test_offsets() {
        assert_eq!(offset_for("PST").unwrap().local_minus_utc(), -8 * 3600);
        assert_eq!(offset_for("IST").unwrap().local_minus_utc(), 5 * 3600 + 1800);
        assert_eq!(offset_for("UTC").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_table_has_no_duplicates() {
        let mut names: Vec<_> = KNOWN_TIMEZONES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), KNOWN_TIMEZONES.len());
    }
}
