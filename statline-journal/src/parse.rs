use std::iter::FusedIterator;
use std::str::Split;
use std::time::Duration;

use crate::{RejectSink, Sample, UnixTimestamp};

/// The default window after which samples count as stale and are rejected.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(2 * 60 * 60);

/// Why a journal line was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RejectReason {
    /// The line does not have exactly three space-delimited fields.
    #[error("line does not have exactly three fields")]
    FieldCount,

    /// The timestamp field is older than the staleness cutoff, or invalid.
    #[error("timestamp is stale or invalid")]
    StaleTimestamp,

    /// The value field does not parse to a finite number.
    #[error("value is not a finite number")]
    InvalidValue,
}

/// A journal line that failed validation, borrowing the raw text it came
/// from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RejectedLine<'a> {
    /// The raw line text, without the trailing newline.
    pub line: &'a str,

    /// Why the line was rejected.
    pub reason: RejectReason,
}

impl Sample {
    /// Parses journal contents into samples, diverting rejected lines.
    ///
    /// Returns the valid samples in input order. The raw text of every
    /// rejected line is appended to `sink` if one is given; with no sink,
    /// rejects are dropped after a debug log. Samples whose timestamp is not
    /// strictly newer than `now - stale_threshold` are rejected as stale.
    ///
    /// # Example
    ///
    /// ```
    /// use statline_journal::{DEFAULT_STALE_THRESHOLD, RejectSink, Sample};
    ///
    /// let sink = RejectSink::new();
    /// let samples = Sample::parse("garbage\n", None, DEFAULT_STALE_THRESHOLD, Some(&sink));
    ///
    /// assert!(samples.is_empty());
    /// assert_eq!(sink.drain(), vec!["garbage".to_owned()]);
    /// ```
    pub fn parse(
        contents: &str,
        instance: Option<&str>,
        stale_threshold: Duration,
        sink: Option<&RejectSink>,
    ) -> Vec<Sample> {
        let oldest = UnixTimestamp::now().saturating_sub(stale_threshold);
        let mut samples = Vec::new();

        for result in Self::parse_all(contents, instance, oldest) {
            match result {
                Ok(sample) => samples.push(sample),
                Err(rejected) => match sink {
                    Some(sink) => sink.push(rejected.line),
                    None => statline_log::debug!(
                        reason = %rejected.reason,
                        line = rejected.line,
                        "dropping rejected journal line"
                    ),
                },
            }
        }

        samples
    }

    /// Parses journal contents line by line.
    ///
    /// Returns one result per non-empty line, in input order. Lines split on
    /// UNIX newlines; a trailing carriage return is stripped. `oldest` is the
    /// exclusive staleness cutoff: samples collected at or before it are
    /// rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use statline_journal::{Sample, UnixTimestamp};
    ///
    /// let contents = "1420115696 app.hits 3\n";
    /// let oldest = UnixTimestamp::from_secs(1420115695);
    ///
    /// for result in Sample::parse_all(contents, None, oldest) {
    ///     let sample = result.expect("line should parse");
    ///     assert_eq!(sample.name, "app.hits");
    /// }
    /// ```
    pub fn parse_all<'a>(
        contents: &'a str,
        instance: Option<&'a str>,
        oldest: UnixTimestamp,
    ) -> ParseSamples<'a> {
        ParseSamples {
            lines: contents.split('\n'),
            instance,
            oldest,
        }
    }
}

fn parse_line<'a>(
    line: &'a str,
    instance: Option<&str>,
    oldest: UnixTimestamp,
) -> Result<Sample, RejectedLine<'a>> {
    let reject = |reason| RejectedLine { line, reason };

    // Split on single spaces: consecutive spaces yield empty fields and fail
    // the exact-three-fields rule.
    let mut fields = line.split(' ');
    let (Some(timestamp), Some(name), Some(value), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(reject(RejectReason::FieldCount));
    };

    let collected_at = UnixTimestamp::parse(timestamp);
    if collected_at <= oldest {
        return Err(reject(RejectReason::StaleTimestamp));
    }

    let Some(value) = parse_value(value) else {
        return Err(reject(RejectReason::InvalidValue));
    };

    Ok(Sample {
        name: name.to_owned(),
        value,
        collected_at,
        instance: instance.map(str::to_owned),
    })
}

/// Parses the value field of a journal line.
///
/// The finiteness check runs on the parsed number before the zero fallback is
/// applied to the output, so non-finite input is rejected rather than masked
/// to `0`. Negative zero collapses to positive zero.
fn parse_value(field: &str) -> Option<f64> {
    let value: f64 = field.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if value == 0.0 { 0.0 } else { value })
}

/// Iterator over parsed samples returned from [`Sample::parse_all`].
#[derive(Clone, Debug)]
pub struct ParseSamples<'a> {
    lines: Split<'a, char>,
    instance: Option<&'a str>,
    oldest: UnixTimestamp,
}

impl<'a> Iterator for ParseSamples<'a> {
    type Item = Result<Sample, RejectedLine<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            let line = line.strip_suffix('\r').unwrap_or(line);

            if !line.is_empty() {
                return Some(parse_line(line, self.instance, self.oldest));
            }
        }
    }
}

impl FusedIterator for ParseSamples<'_> {}
