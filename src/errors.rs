//! Error types.

use std::path::PathBuf;

/// A boxed, opaque error raised inside a [`Handler`](crate::Handler).
///
/// Handler failures are not interpreted by the dispatch pipeline; they are
/// wrapped in [`Error::Handler`] and propagated to the caller of
/// [`Router::execute`](crate::Router::execute) untouched.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A specialized [`Result`](std::result::Result) type for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error produced while registering directories, resolving a request or
/// executing a handler chain.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A directory registration named a path that is not an existing
    /// directory.
    #[error("could not register handler directory: `{}` is not a directory", path.display())]
    NotADirectory {
        /// The normalized path that failed the check.
        path: PathBuf,
    },

    /// A request was dispatched before any directory was registered.
    #[error("no handler directories have been registered")]
    NoDirectories,

    /// No registered directory could resolve the request path, not even to
    /// a `_default` fallback.
    #[error("invalid request path: no handler or `_default` fallback matched")]
    UnresolvedPath,

    /// Resolution picked a handler file that has no registered [`Handler`]
    /// callback.
    ///
    /// [`Handler`]: crate::Handler
    #[error("no handler is registered for `{}`", path.display())]
    MissingHandler {
        /// The resolved handler file path.
        path: PathBuf,
    },

    /// The request URL could not be parsed.
    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] http::uri::InvalidUri),

    /// The request method was not a valid HTTP method token.
    #[error("invalid request method: {0}")]
    InvalidMethod(#[from] http::method::InvalidMethod),

    /// A handler failed. The inner error is whatever the handler returned.
    #[error("handler error: {0}")]
    Handler(#[source] BoxError),
}
