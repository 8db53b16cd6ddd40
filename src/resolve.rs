//! Longest-match file resolution.
//!
//! Every registered directory proposes a [`ResolvedMatch`] for a request
//! path: the search probes for a `_default` fallback or an exact-named
//! handler file, backtracking one segment at a time and collecting the
//! unmatched tail as arguments. The candidate that consumed the most
//! segments wins; ties go to the earliest directory in registry order.

use std::path::PathBuf;

use crate::errors::{Error, Result};
use crate::registry::{ExtensionPolicy, RegisteredDirectory, Registry};

/// File-name marker for a directory's fallback handler.
pub(crate) const DEFAULT_MARKER: &str = "_default";

/// File-name marker for a directory's cascade handler.
pub(crate) const GLOBAL_MARKER: &str = "_global";

/// One directory's proposed resolution of a request path.
#[derive(Debug)]
pub(crate) struct ResolvedMatch<'a> {
    pub(crate) directory: &'a RegisteredDirectory,
    /// Path segments of the matched handler file, relative to the
    /// directory. May end with a `_default` marker.
    pub(crate) file: Vec<String>,
    /// Leftover path segments that did not take part in the match.
    pub(crate) args: Vec<String>,
    /// The extension split off the final segment, if the directory's
    /// policy applied.
    pub(crate) extension: Option<String>,
}

/// Resolves `segments` against every registered directory and returns the
/// best match.
///
/// `full_path` is the cleaned request path with a leading `/`, used for
/// extension-prefix comparison. `handler_ext` is the extension of handler
/// files on disk, without the dot.
pub(crate) fn resolve<'a>(
    registry: &'a Registry,
    segments: &[String],
    full_path: &str,
    handler_ext: &str,
) -> Result<ResolvedMatch<'a>> {
    let mut best: Option<ResolvedMatch<'a>> = None;

    for directory in registry.iter() {
        let candidate = resolve_in(directory, segments, full_path, handler_ext);
        tracing::trace!(
            directory = %directory.path().display(),
            file = ?candidate.file,
            args = ?candidate.args,
            "resolution candidate"
        );
        // Only a strictly longer match replaces the current winner, so the
        // earliest candidate in priority order wins ties.
        let promote = match &best {
            None => true,
            Some(current) => consumed(&candidate.file) > consumed(&current.file),
        };
        if promote {
            best = Some(candidate);
        }
    }

    match best {
        Some(resolved) if !resolved.file.is_empty() => Ok(resolved),
        _ => Err(Error::UnresolvedPath),
    }
}

/// Resolves `segments` within a single directory.
///
/// A directory whose prefix does not match still produces a candidate, one
/// that consumed zero segments; "no match" is expressed by that rather
/// than by an error, so candidates compare uniformly.
fn resolve_in<'a>(
    directory: &'a RegisteredDirectory,
    segments: &[String],
    full_path: &str,
    handler_ext: &str,
) -> ResolvedMatch<'a> {
    let working: &[String] = if directory.prefix.is_empty() {
        segments
    } else if segments.len() >= directory.prefix.len()
        && segments[..directory.prefix.len()] == directory.prefix[..]
    {
        &segments[directory.prefix.len()..]
    } else {
        return ResolvedMatch {
            directory,
            file: Vec::new(),
            args: segments.to_vec(),
            extension: None,
        };
    };

    let mut file: Vec<String> = working.to_vec();
    let mut extension = None;

    if extension_applies(&directory.extensions, full_path) {
        if let Some(last) = file.last_mut() {
            let split = last
                .split_once('.')
                .map(|(name, ext)| (name.to_owned(), ext.to_owned()));
            if let Some((name, ext)) = split {
                *last = name;
                extension = Some(ext);
            }
        }
    }

    let mut args: Vec<String> = Vec::new();
    loop {
        let mut base = directory.path.clone();
        base.extend(file.iter());

        if base
            .join(format!("{}.{}", DEFAULT_MARKER, handler_ext))
            .is_file()
        {
            file.push(DEFAULT_MARKER.to_owned());
            break;
        }
        if !file.is_empty() && sibling_file(&base, handler_ext).is_file() {
            break;
        }
        match file.pop() {
            Some(segment) => args.insert(0, segment),
            None => break,
        }
    }

    ResolvedMatch {
        directory,
        file,
        args,
        extension,
    }
}

/// Whether the directory's extension policy applies to this request.
fn extension_applies(policy: &ExtensionPolicy, full_path: &str) -> bool {
    match policy {
        ExtensionPolicy::None => false,
        ExtensionPolicy::All => true,
        ExtensionPolicy::Prefixes(prefixes) => prefixes.iter().any(|prefix| {
            full_path == prefix
                || full_path.starts_with(&format!("{}/", prefix))
                || full_path.starts_with(&format!("{}.", prefix))
        }),
    }
}

/// Appends `.{handler_ext}` to the last component of `base`.
fn sibling_file(base: &PathBuf, handler_ext: &str) -> PathBuf {
    let mut named = base.clone().into_os_string();
    named.push(format!(".{}", handler_ext));
    PathBuf::from(named)
}

/// The number of request segments a candidate consumed: the length of its
/// file segment list, not counting a `_default` marker.
pub(crate) fn consumed(file: &[String]) -> usize {
    file.iter().filter(|segment| *segment != DEFAULT_MARKER).count()
}
