//! Wall-clock timestamp utilities
//!
//! Itinerary times are local wall-clock times at the venue (no offset). Input
//! from language models is inconsistent, so parsing accepts several shapes:
//! `2025-03-02T19:30:00`, `2025-03-02T19:30`, `2025-03-02 19:30:00`, fractional
//! seconds, and RFC 3339 with an offset or `Z` (the offset is dropped and the
//! local reading kept). Serialization always uses [`WALL_CLOCK_FORMAT`].

use chrono::{DateTime, Local, NaiveDateTime};

/// Canonical serialization format
pub const WALL_CLOCK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a wall-clock timestamp in any accepted shape
pub fn parse_wall_clock(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }

    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
}

/// Format a wall-clock timestamp canonically
pub fn format_wall_clock(value: &NaiveDateTime) -> String {
    value.format(WALL_CLOCK_FORMAT).to_string()
}

/// Current local wall-clock time
pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Serde adapter for `NaiveDateTime` fields
pub mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_wall_clock(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_wall_clock(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {:?}", raw)))
    }
}

/// Serde adapter for `Option<NaiveDateTime>` fields
pub mod wall_clock_opt {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&super::format_wall_clock(v)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_wall_clock(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {:?}", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use serde::{Deserialize, Serialize};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_canonical() {
        assert_eq!(parse_wall_clock("2025-03-02T19:30:00"), Some(at(19, 30)));
    }

    #[test]
    fn test_parse_minutes_only_and_space_separator() {
        assert_eq!(parse_wall_clock("2025-03-02T19:30"), Some(at(19, 30)));
        assert_eq!(parse_wall_clock("2025-03-02 19:30:00"), Some(at(19, 30)));
        assert_eq!(parse_wall_clock(" 2025-03-02 19:30 "), Some(at(19, 30)));
    }

    #[test]
    fn test_parse_rfc3339_keeps_local_reading() {
        assert_eq!(parse_wall_clock("2025-03-02T19:30:00Z"), Some(at(19, 30)));
        assert_eq!(
            parse_wall_clock("2025-03-02T19:30:00-05:00"),
            Some(at(19, 30))
        );
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let parsed = parse_wall_clock("2025-03-02T19:30:00.250").unwrap();
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_wall_clock(""), None);
        assert_eq!(parse_wall_clock("7:30 PM"), None);
        assert_eq!(parse_wall_clock("2025-13-02T19:30:00"), None);
    }

    #[derive(Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "wall_clock")]
        at: NaiveDateTime,
        #[serde(with = "wall_clock_opt", default)]
        until: Option<NaiveDateTime>,
    }

    #[test]
    fn test_serde_adapters() {
        let sample: Sample = serde_json::from_str(r#"{"at":"2025-03-02T19:30:00Z"}"#).unwrap();
        assert_eq!(sample.at, at(19, 30));
        assert!(sample.until.is_none());

        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["at"], "2025-03-02T19:30:00");
        assert!(json["until"].is_null());
    }

    #[test]
    fn test_serde_rejects_invalid_timestamp() {
        let result: std::result::Result<Sample, _> =
            serde_json::from_str(r#"{"at":"tonight"}"#);
        assert!(result.is_err());
    }
}
