#![forbid(unsafe_code)]

//! # Trellis
//!
//! A filesystem-routed request dispatcher.
//!
//! ## Routing by directory layout
//!
//! Trellis maps a request path onto handler files beneath registered
//! directories. Resolution walks the path's segments into the directory
//! tree, backtracking one segment at a time until it finds a handler file
//! or a `_default` fallback; the unmatched tail becomes the request's
//! arguments. Across directories, the longest match wins.
//!
//! A minimal setup looks like this:
//!
//! ```no_run
//! use trellis::{Directory, Router, Value};
//!
//! let mut router = Router::new();
//! router.register(Directory::new("handlers"))?;
//! router.handle("handlers/_default.rs", |_scope: &mut trellis::Scope<'_>| {
//!     Ok(Value::from("Hello World!"))
//! });
//!
//! let mut ctx = router.dispatch("GET", "http://localhost/")?;
//! let body = router.execute(&mut ctx, true)?;
//! assert_eq!(ctx.status_code(), Some(200));
//! # Ok::<(), trellis::Error>(())
//! ```
//!
//! Before the target handler runs, every `_global` handler on the path
//! from the directory root down to the target's directory is executed in
//! order; a `_global` handler that produces a body or an error status
//! cancels the request. Handlers can start nested internal requests
//! through their [`Scope`], which share one execution stack with the main
//! request.

mod context;
mod dispatch;
pub mod errors;
mod handler;
pub mod header;
pub mod path;
mod registry;
mod resolve;
mod stack;
pub mod test;
mod values;

pub use http::{Method, StatusCode, Uri};

pub use self::{
    context::DispatchContext,
    dispatch::{Router, Scope, DEFAULT_HANDLER_EXTENSION},
    errors::{BoxError, Error, Result},
    handler::{Handler, Value},
    registry::{Directory, ExtensionPolicy, RegisteredDirectory},
    stack::{ExecutionStack, Frame},
    values::Values,
};
