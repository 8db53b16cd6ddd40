//! Utilities for testing routing and handlers.
//!
//! [`Site`] builds a handler directory layout on disk, since resolution is
//! driven by which handler files exist. The free functions construct
//! common canned handlers.
//!
//! # Example
//!
//! ```no_run
//! use trellis::{Directory, Router};
//! use trellis::test;
//!
//! let tmp = std::env::temp_dir().join("trellis-doc");
//! let site = test::Site::new(&tmp);
//! site.file("_default.rs");
//!
//! let mut router = Router::new();
//! router.register(Directory::new(site.root()))?;
//! router.handle(site.root().join("_default.rs"), test::text("Hello World!"));
//! # Ok::<(), trellis::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::dispatch::Scope;
use crate::errors::BoxError;
use crate::handler::Value;

/// A handler directory layout under a caller-supplied root.
///
/// Tests usually put the root inside a [`tempfile::tempdir`] so the layout
/// is cleaned up with the test.
#[derive(Debug)]
pub struct Site {
    root: PathBuf,
}

impl Site {
    /// Creates the root directory (and any missing parents) and returns
    /// the site.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        fs::create_dir_all(&root).expect("failed to create site root");
        Self { root }
    }

    /// The root directory of the site.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates an empty handler file at `relative`, creating intermediate
    /// directories as needed, and returns its absolute path.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created.
    pub fn file(&self, relative: impl AsRef<Path>) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create handler directory");
        }
        fs::write(&path, "").expect("failed to create handler file");
        path
    }

    /// Creates an empty directory at `relative` and returns its absolute
    /// path.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    pub fn dir(&self, relative: impl AsRef<Path>) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(&path).expect("failed to create directory");
        path
    }
}

/// A handler returning a fixed text body.
pub fn text(body: impl Into<String>) -> impl crate::Handler {
    let body = body.into();
    move |_: &mut Scope<'_>| -> Result<Value, BoxError> { Ok(Value::from(body.clone())) }
}

/// A handler returning a fixed status code.
pub fn status(code: i64) -> impl crate::Handler {
    move |_: &mut Scope<'_>| -> Result<Value, BoxError> { Ok(Value::from(code)) }
}

/// A handler returning nothing.
pub fn empty() -> impl crate::Handler {
    |_: &mut Scope<'_>| -> Result<Value, BoxError> { Ok(Value::Null) }
}
