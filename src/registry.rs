//! Handler directory registration.
//!
//! A [`Router`](crate::Router) looks for handler files beneath a set of
//! registered directories. Each registration carries the matching rules for
//! its directory: an optional path [prefix](Directory::prefix), a
//! [priority](Directory::priority) deciding the order directories are tried
//! in, and an [`ExtensionPolicy`] deciding whether trailing `.ext` suffixes
//! are split off before file lookup.

use std::env;
use std::path::PathBuf;

use crate::errors::{Error, Result};
use crate::path;

/// Controls whether a trailing `.ext` on the final path segment is split
/// off before file lookup.
///
/// When a split occurs, the segment's name (without the extension) is used
/// for lookup and the extension is recorded on the dispatch context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtensionPolicy {
    /// Never split extensions.
    #[default]
    None,

    /// Split the final segment at its first `.` whenever one is present.
    All,

    /// Split only for requests whose full cleaned path equals one of the
    /// listed prefixes, or extends one with `/` or `.`.
    ///
    /// The comparison uses the request path as received, before any routing
    /// [prefix](Directory::prefix) is stripped.
    Prefixes(Vec<String>),
}

/// A directory registration spec, passed to [`Router::register`](crate::Router::register).
///
/// # Example
///
/// ```no_run
/// use trellis::{Directory, ExtensionPolicy, Router};
///
/// let mut router = Router::new();
/// router.register(
///     Directory::new("handlers/api")
///         .prefix("api")
///         .priority(10)
///         .extensions(ExtensionPolicy::All),
/// )?;
/// # Ok::<(), trellis::Error>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct Directory {
    path: PathBuf,
    prefix: String,
    priority: Option<i32>,
    extensions: ExtensionPolicy,
}

impl Directory {
    /// Creates a spec for the directory at `path`.
    ///
    /// A relative path is resolved against the current working directory at
    /// registration time.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            prefix: String::new(),
            priority: None,
            extensions: ExtensionPolicy::None,
        }
    }

    /// Requires the request's leading path segments to equal `prefix` for
    /// this directory to match.
    ///
    /// Defaults to no prefix, matching all paths.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the priority of this directory. Higher priorities are tried
    /// first.
    ///
    /// Defaults to one more than the highest registered priority, so later
    /// registrations win by default.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the extension policy of this directory.
    ///
    /// Defaults to [`ExtensionPolicy::None`].
    pub fn extensions(mut self, policy: ExtensionPolicy) -> Self {
        self.extensions = policy;
        self
    }
}

/// A registered directory, after normalization.
#[derive(Debug, Clone)]
pub struct RegisteredDirectory {
    pub(crate) path: PathBuf,
    pub(crate) prefix: Vec<String>,
    pub(crate) priority: i32,
    pub(crate) extensions: ExtensionPolicy,
}

impl RegisteredDirectory {
    /// The absolute path of the directory.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// The cleaned prefix segments, empty if the directory matches all
    /// paths.
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// The directory's priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The directory's extension policy.
    pub fn extensions(&self) -> &ExtensionPolicy {
        &self.extensions
    }
}

/// The ordered set of registered directories.
///
/// Kept sorted by descending priority, stable on registration order.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    dirs: Vec<RegisteredDirectory>,
}

impl Registry {
    /// Normalizes and appends a registration, then re-sorts.
    ///
    /// # Panics
    ///
    /// Panics if a relative path is registered and the current working
    /// directory cannot be determined.
    pub(crate) fn register(&mut self, spec: Directory) -> Result<()> {
        let path = normalize(spec.path);

        if !path.is_dir() {
            return Err(Error::NotADirectory { path });
        }

        let priority = spec.priority.unwrap_or_else(|| {
            self.dirs.iter().map(|dir| dir.priority).max().unwrap_or(0) + 1
        });

        let extensions = match spec.extensions {
            ExtensionPolicy::Prefixes(prefixes) => ExtensionPolicy::Prefixes(
                prefixes
                    .iter()
                    .map(|prefix| format!("/{}", path::clean_str(prefix)))
                    .collect(),
            ),
            other => other,
        };

        tracing::debug!(path = %path.display(), priority, "registering handler directory");

        self.dirs.push(RegisteredDirectory {
            path,
            prefix: path::clean(&spec.prefix),
            priority,
            extensions,
        });
        self.dirs.sort_by_key(|dir| std::cmp::Reverse(dir.priority));

        Ok(())
    }

    /// Clears all registrations.
    pub(crate) fn reset(&mut self) {
        self.dirs.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// The directories in resolution order: descending priority, then
    /// registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &RegisteredDirectory> {
        self.dirs.iter()
    }
}

/// Resolves a path against the current working directory and drops any
/// trailing separator, so `"foo/bar/"` and `"foo/bar"` compare equal.
///
/// # Panics
///
/// Panics if the path is relative and the current working directory cannot
/// be determined.
pub(crate) fn normalize(path: PathBuf) -> PathBuf {
    let path = if path.is_absolute() {
        path
    } else {
        env::current_dir()
            .expect("current working directory should be accessible")
            .join(path)
    };
    path.components().collect()
}
