//! Handler callbacks and their registration.
//!
//! A handler is the executable counterpart of a handler file on disk: the
//! file's existence drives routing, and the callback registered against the
//! file's path (with [`Router::handle`](crate::Router::handle)) provides
//! the behavior. The dispatch pipeline is indifferent to what a handler
//! does; it only interprets the handler's return [`Value`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::dispatch::Scope;
use crate::errors::BoxError;

/// The uniform handler return and response body type.
///
/// A number in `[100, 600)` is interpreted as a status code; anything else
/// non-empty becomes the response body as-is.
pub use serde_json::Value;

/// An executable handler, invoked with the [`Scope`] of one dispatch.
///
/// Implemented for any compatible closure, so handlers are usually written
/// inline:
///
/// ```no_run
/// # let mut router = trellis::Router::new();
/// router.handle("handlers/_default.rs", |_scope: &mut trellis::Scope<'_>| {
///     Ok(trellis::Value::from("Hello World!"))
/// });
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Runs the handler.
    ///
    /// An `Err` propagates out of the whole `execute` call untouched; the
    /// pipeline never recovers a failed handler.
    fn call(&self, scope: &mut Scope<'_>) -> Result<Value, BoxError>;
}

impl<F> Handler for F
where
    F: Fn(&mut Scope<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    fn call(&self, scope: &mut Scope<'_>) -> Result<Value, BoxError> {
        self(scope)
    }
}

/// Registered handlers, keyed by the absolute path of their handler file.
#[derive(Default)]
pub(crate) struct Handlers {
    map: HashMap<PathBuf, Box<dyn Handler>>,
}

impl Handlers {
    pub(crate) fn insert(&mut self, path: PathBuf, handler: Box<dyn Handler>) {
        self.map.insert(path, handler);
    }

    pub(crate) fn get(&self, path: &Path) -> Option<&dyn Handler> {
        self.map.get(path).map(|handler| &**handler)
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}
