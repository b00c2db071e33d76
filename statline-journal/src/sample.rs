use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::UnixTimestamp;

/// A validated journal sample destined for a metrics backend.
///
/// Samples are created by the journal parser and consumed once by an upload
/// backend; they are never mutated. Their serialized form is the entry shape
/// of the upload payload's `data` array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// The metric name, including the journal's prefix.
    ///
    /// Names must not contain whitespace; the journal line format is
    /// whitespace-delimited.
    pub name: String,

    /// The sampled value.
    ///
    /// Always finite; the parser rejects lines whose value field is not.
    pub value: f64,

    /// The time the sample was collected, in full unix seconds.
    pub collected_at: UnixTimestamp,

    /// The identity of the host or process that collected the sample.
    ///
    /// Serializes as `null` when absent.
    pub instance: Option<String>,
}

/// Encodes one journal line.
///
/// The output format is `"<timestamp-text> <prefix><name> <value>\n"`. When
/// `timestamp` is `None`, the current UTC time is rendered as RFC 3339 with
/// millisecond precision.
///
/// Neither `name` nor `value` are validated here; it is the caller's job to
/// keep whitespace out of them.
///
/// # Example
///
/// ```
/// let line = statline_journal::encode_line(
///     "unit.test.",
///     "stat-name",
///     111.0,
///     Some("2015-01-01T12:34:56.789Z"),
/// );
///
/// assert_eq!(line, "2015-01-01T12:34:56.789Z unit.test.stat-name 111\n");
/// ```
pub fn encode_line(prefix: &str, name: &str, value: f64, timestamp: Option<&str>) -> String {
    match timestamp {
        Some(timestamp) => format!("{timestamp} {prefix}{name} {value}\n"),
        None => {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            format!("{now} {prefix}{name} {value}\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn test_encode_line() {
        let line = encode_line(
            "unit.test.",
            "stat-name",
            111.0,
            Some("2015-01-01T12:34:56.789Z"),
        );

        assert_eq!(line, "2015-01-01T12:34:56.789Z unit.test.stat-name 111\n");
    }

    #[test]
    fn test_encode_line_fractional_value() {
        let line = encode_line("", "ratio", 0.5, Some("1420115696"));
        assert_eq!(line, "1420115696 ratio 0.5\n");
    }

    #[test]
    fn test_encode_line_generated_timestamp() {
        let before = UnixTimestamp::now();
        let line = encode_line("app.", "hits", 3.0, None);
        let after = UnixTimestamp::now();

        let fields: Vec<&str> = line.trim_end().split(' ').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], "app.hits");
        assert_eq!(fields[2], "3");

        let stamped = UnixTimestamp::parse(fields[0]);
        assert!(before <= stamped && stamped <= after);
    }

    #[test]
    fn test_sample_wire_shape() {
        let sample = Sample {
            name: "app.hits".to_owned(),
            value: 2.0,
            collected_at: UnixTimestamp::from_secs(1420115696),
            instance: None,
        };

        assert_eq!(
            serde_json::to_value(&sample).unwrap(),
            serde_json::json!({
                "name": "app.hits",
                "value": 2.0,
                "collected_at": 1420115696,
                "instance": null,
            })
        );
    }
}
