//! HTTP Range header grammar and byte-span resolution.
//!
//! Only the single-range form `bytes=start-` / `bytes=start-end` is
//! recognized. Every other shape of the header (multi-range sets, suffix
//! ranges, non-`bytes` units, malformed digits) downgrades to a full
//! response instead of an error.

/// A resolved, satisfiable byte span within a file.
///
/// Both bounds are inclusive. Invariant: `start <= end < file_size` at
/// construction time, so `len` never under- or overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRange {
    /// First byte position.
    pub start: u64,
    /// Last byte position (inclusive, already clamped to the file size).
    pub end: u64,
}

impl ActiveRange {
    /// Number of bytes covered by the span.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Render the `Content-Range` header value for this span.
    #[must_use]
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

/// Outcome of inspecting the `Range` header against a file's size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Recognized and satisfiable - respond 206 with this span.
    Partial(ActiveRange),
    /// Recognized but `start` is at or past the end of the file - respond 416.
    Unsatisfiable,
    /// No header, or a shape we do not recognize - respond 200 with the
    /// whole file.
    Full,
}

/// Evaluate a `Range` header value against the target file size.
///
/// # Examples
/// ```
/// use rangehttpd::http::range::{evaluate_range, ActiveRange, RangeOutcome};
///
/// assert_eq!(
///     evaluate_range(Some("bytes=0-99"), 1000),
///     RangeOutcome::Partial(ActiveRange { start: 0, end: 99 })
/// );
/// assert_eq!(evaluate_range(None, 1000), RangeOutcome::Full);
/// assert_eq!(evaluate_range(Some("bytes=1000-"), 1000), RangeOutcome::Unsatisfiable);
/// ```
#[must_use]
pub fn evaluate_range(header: Option<&str>, file_size: u64) -> RangeOutcome {
    let Some(header) = header else {
        return RangeOutcome::Full;
    };

    let Some(spec) = header.strip_prefix("bytes=") else {
        return RangeOutcome::Full; // not the bytes unit
    };

    // Multi-range sets are deliberately not supported
    if spec.contains(',') {
        return RangeOutcome::Full;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };

    // Suffix form "bytes=-N" is outside the recognized grammar
    if start_str.is_empty() {
        return RangeOutcome::Full;
    }

    let Ok(start) = start_str.parse::<u64>() else {
        return RangeOutcome::Full;
    };

    // Also covers empty files: any start is past the end
    if start >= file_size {
        return RangeOutcome::Unsatisfiable;
    }

    let end = if end_str.is_empty() {
        file_size - 1 // open-ended: to end of file
    } else {
        match end_str.parse::<u64>() {
            Ok(e) => e.min(file_size - 1),
            Err(_) => return RangeOutcome::Full,
        }
    };

    // A reversed span is an invalid byte-range-spec; the header is ignored
    if start > end {
        return RangeOutcome::Full;
    }

    RangeOutcome::Partial(ActiveRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_header_is_full() {
        assert_eq!(evaluate_range(None, 100), RangeOutcome::Full);
    }

    #[test]
    fn standard_range() {
        match evaluate_range(Some("bytes=0-9"), 100) {
            RangeOutcome::Partial(r) => {
                assert_eq!(r.start, 0);
                assert_eq!(r.end, 9);
                assert_eq!(r.len(), 10);
                assert_eq!(r.content_range(100), "bytes 0-9/100");
            }
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[test]
    fn open_ended_range_runs_to_end_of_file() {
        match evaluate_range(Some("bytes=50-"), 100) {
            RangeOutcome::Partial(r) => {
                assert_eq!(r.start, 50);
                assert_eq!(r.end, 99);
                assert_eq!(r.len(), 50);
            }
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[test]
    fn end_is_clamped_to_file_size() {
        match evaluate_range(Some("bytes=90-5000"), 100) {
            RangeOutcome::Partial(r) => {
                assert_eq!(r.start, 90);
                assert_eq!(r.end, 99);
            }
            other => panic!("expected Partial, got {other:?}"),
        }
    }

    #[test]
    fn start_at_or_past_size_is_unsatisfiable() {
        assert_eq!(
            evaluate_range(Some("bytes=100-"), 100),
            RangeOutcome::Unsatisfiable
        );
        assert_eq!(
            evaluate_range(Some("bytes=200-300"), 100),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn empty_file_never_satisfies_a_range() {
        assert_eq!(
            evaluate_range(Some("bytes=0-"), 0),
            RangeOutcome::Unsatisfiable
        );
    }

    #[test]
    fn suffix_form_downgrades_to_full() {
        assert_eq!(evaluate_range(Some("bytes=-500"), 100), RangeOutcome::Full);
    }

    #[test]
    fn multi_range_downgrades_to_full() {
        assert_eq!(
            evaluate_range(Some("bytes=0-100,200-300"), 1000),
            RangeOutcome::Full
        );
    }

    #[test]
    fn malformed_headers_downgrade_to_full() {
        assert_eq!(evaluate_range(Some("bytes=a-b"), 100), RangeOutcome::Full);
        assert_eq!(evaluate_range(Some("bytes=5-x"), 100), RangeOutcome::Full);
        assert_eq!(evaluate_range(Some("bytes= 5-10"), 100), RangeOutcome::Full);
        assert_eq!(evaluate_range(Some("items=0-10"), 100), RangeOutcome::Full);
        assert_eq!(evaluate_range(Some("bytes=5"), 100), RangeOutcome::Full);
        assert_eq!(evaluate_range(Some("bytes=-"), 100), RangeOutcome::Full);
    }

    #[test]
    fn reversed_range_downgrades_to_full() {
        assert_eq!(evaluate_range(Some("bytes=30-20"), 100), RangeOutcome::Full);
    }

    #[test]
    fn million_byte_scenarios() {
        match evaluate_range(Some("bytes=500000-500999"), 1_000_000) {
            RangeOutcome::Partial(r) => {
                assert_eq!(r.len(), 1000);
                assert_eq!(r.content_range(1_000_000), "bytes 500000-500999/1000000");
            }
            other => panic!("expected Partial, got {other:?}"),
        }

        match evaluate_range(Some("bytes=999999-2000000"), 1_000_000) {
            RangeOutcome::Partial(r) => {
                assert_eq!(r.start, 999_999);
                assert_eq!(r.end, 999_999);
                assert_eq!(r.len(), 1);
            }
            other => panic!("expected Partial, got {other:?}"),
        }

        assert_eq!(
            evaluate_range(Some("bytes=1000000-"), 1_000_000),
            RangeOutcome::Unsatisfiable
        );
    }
}
