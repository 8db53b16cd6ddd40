//! Request path cleaning.
//!
//! A request path is handled as a sequence of *segments*: the `/`-delimited,
//! percent-decoded components of the path. [`clean`] produces that sequence,
//! collapsing any leading, trailing or duplicate slashes.

use percent_encoding::percent_decode_str;

/// Splits a path on `/` into cleaned segments.
///
/// Empty segments are removed and every remaining segment is
/// percent-decoded. The result is independent of leading and trailing
/// slashes, so `clean` is idempotent over its own joined output.
///
/// # Example
///
/// ```
/// assert_eq!(trellis::path::clean("/a//b%20c/"), ["a", "b c"]);
/// ```
pub fn clean(path: &str) -> Vec<String> {
    clean_segments(path.split('/'))
}

/// Cleans an already-split sequence of path segments.
///
/// This is the same operation as [`clean`], for callers that hold segments
/// rather than a joined string.
pub fn clean_segments<I>(segments: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    segments
        .into_iter()
        .filter(|segment| !segment.as_ref().is_empty())
        .map(|segment| {
            percent_decode_str(segment.as_ref())
                .decode_utf8_lossy()
                .into_owned()
        })
        .collect()
}

/// Cleans a path and joins the segments back into a `/`-separated string.
///
/// The returned string has no leading or trailing slash.
pub fn clean_str(path: &str) -> String {
    clean(path).join("/")
}
