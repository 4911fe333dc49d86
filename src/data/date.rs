use chrono::{
    format::{Item, StrftimeItems},
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use serde::{Serialize, Serializer};

/// A publish date. Date-only values are pinned to midnight UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishDate(DateTime<FixedOffset>);

impl PublishDate {
    /// accepts `YYYY-MM-DD`, RFC 3339 and offset-less `YYYY-MM-DD[T ]HH:MM:SS`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(Self(dt));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return Some(Self::from_naive(naive));
            }
        }
        if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return day.and_hms_opt(0, 0, 0).map(Self::from_naive);
        }

        None
    }

    fn from_naive(naive: NaiveDateTime) -> Self {
        Self(Utc.from_utc_datetime(&naive).into())
    }

    pub fn to_rfc2822(&self) -> String {
        self.0.to_rfc2822()
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Formats with a strftime pattern or a Go style reference layout
    /// such as `January 2, 2006`. Unusable patterns fall back to `%Y-%m-%d`.
    pub fn format(&self, pattern: &str) -> String {
        let pattern = to_strftime(pattern);
        if !is_valid_strftime(&pattern) {
            return self.0.format("%Y-%m-%d").to_string();
        }
        self.0.format(&pattern).to_string()
    }

    pub fn year(&self) -> i32 {
        use chrono::Datelike;
        self.0.year()
    }
}

/// Go reference layout tokens, longest first
const GO_LAYOUT: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Monday", "%A"),
    ("-0700", "%z"),
    ("2006", "%Y"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("01", "%m"),
    ("02", "%d"),
    ("_2", "%e"),
    ("15", "%H"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("PM", "%p"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
];

/// strftime patterns pass through, Go layouts are translated
pub fn to_strftime(pattern: &str) -> String {
    if pattern.contains('%') {
        return pattern.to_owned();
    }
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        for (token, replacement) in GO_LAYOUT {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(replacement);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

pub fn is_valid_strftime(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

impl Serialize for PublishDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dates() {
        let date = PublishDate::parse("2023-01-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2023-01-01T00:00:00+00:00");
        assert_eq!(date.year(), 2023);
    }

    #[test]
    fn parses_timestamps_with_offsets() {
        let date = PublishDate::parse("2022-06-05T10:30:00+08:00").unwrap();
        assert_eq!(date.to_rfc2822(), "Sun, 5 Jun 2022 10:30:00 +0800");
    }

    #[test]
    fn parses_naive_timestamps() {
        assert!(PublishDate::parse("2022-06-05 10:30:00").is_some());
        assert!(PublishDate::parse("2022-06-05T10:30:00").is_some());
    }

    #[test]
    fn rejects_garbage() {
        assert!(PublishDate::parse("yesterday").is_none());
        assert!(PublishDate::parse("2022-13-40").is_none());
    }

    #[test]
    fn orders_chronologically() {
        let older = PublishDate::parse("2022-01-01").unwrap();
        let newer = PublishDate::parse("2023-01-01").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn formats_with_strftime() {
        let date = PublishDate::parse("2023-03-09").unwrap();
        assert_eq!(date.format("%B %-d, %Y"), "March 9, 2023");
    }

    #[test]
    fn translates_go_layouts() {
        assert_eq!(to_strftime("January 2, 2006"), "%B %-d, %Y");
        assert_eq!(to_strftime("2006-01-02"), "%Y-%m-%d");
        assert_eq!(to_strftime("Mon, 02 Jan 2006"), "%a, %d %b %Y");
        let date = PublishDate::parse("2023-03-09").unwrap();
        assert_eq!(date.format("Jan 2, 2006"), "Mar 9, 2023");
    }

    #[test]
    fn broken_patterns_fall_back() {
        let date = PublishDate::parse("2023-03-09").unwrap();
        assert_eq!(date.format("%Q"), "2023-03-09");
    }
}
