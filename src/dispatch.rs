//! The router: directory registration, request resolution and the
//! execution pipeline.
//!
//! A [`Router`] owns the registered directories and the handler callbacks.
//! [`dispatch`](Router::dispatch) maps a request to a
//! [`DispatchContext`]; [`execute`](Router::execute) runs the `_global`
//! cascade and the target handler against a fresh
//! [`ExecutionStack`](crate::ExecutionStack). Nothing here is shared
//! global state: embedders create one `Router` and, implicitly, one stack
//! per concurrently handled request.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use http::{Method, Uri};

use crate::context::DispatchContext;
use crate::errors::{Error, Result};
use crate::handler::{Handler, Handlers, Value};
use crate::path;
use crate::registry::{self, Directory, Registry};
use crate::resolve::{self, GLOBAL_MARKER};
use crate::stack::{ExecutionStack, Frame};

/// The default extension of handler files on disk, without the dot.
pub const DEFAULT_HANDLER_EXTENSION: &str = "rs";

/// Routes requests to handlers by directory layout and executes them.
///
/// # Example
///
/// ```no_run
/// use trellis::{Directory, Router, Value};
///
/// let mut router = Router::new();
/// router.register(Directory::new("handlers"))?;
/// router.handle("handlers/_default.rs", |_scope: &mut trellis::Scope<'_>| {
///     Ok(Value::from("Hello World!"))
/// });
///
/// let mut ctx = router.dispatch("GET", "http://example.com/")?;
/// let body = router.execute(&mut ctx, true)?;
///
/// assert_eq!(ctx.status_code(), Some(200));
/// assert_eq!(body, Value::from("Hello World!"));
/// # Ok::<(), trellis::Error>(())
/// ```
#[derive(Debug)]
pub struct Router {
    registry: Registry,
    handlers: Handlers,
    handler_ext: String,
    secure: bool,
    default_host: String,
    ids: AtomicU64,
}

impl Router {
    /// Creates a router with no registered directories or handlers.
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            handlers: Handlers::default(),
            handler_ext: DEFAULT_HANDLER_EXTENSION.to_owned(),
            secure: false,
            default_host: "localhost".to_owned(),
            ids: AtomicU64::new(0),
        }
    }

    /// Sets the extension of handler files on disk.
    ///
    /// Defaults to [`DEFAULT_HANDLER_EXTENSION`].
    pub fn handler_extension(&mut self, extension: impl Into<String>) -> &mut Self {
        self.handler_ext = extension.into();
        self
    }

    /// Sets whether the transport is secure, which decides the scheme
    /// assumed for URLs that omit one.
    ///
    /// Defaults to `false`.
    pub fn secure(&mut self, secure: bool) -> &mut Self {
        self.secure = secure;
        self
    }

    /// Sets the host assumed for URLs that omit one.
    ///
    /// Defaults to `"localhost"`.
    pub fn default_host(&mut self, host: impl Into<String>) -> &mut Self {
        self.default_host = host.into();
        self
    }

    /// Registers a handler directory.
    ///
    /// Fails with [`Error::NotADirectory`] if the spec's path does not
    /// denote an existing directory.
    pub fn register(&mut self, directory: Directory) -> Result<()> {
        self.registry.register(directory)
    }

    /// Clears all registered directories.
    ///
    /// Only useful for isolating independent resolution sessions; the
    /// registry otherwise lives as long as the router.
    pub fn reset_directories(&mut self) {
        self.registry.reset();
    }

    /// Registers the handler callback for the handler file at `file`.
    ///
    /// A relative path is resolved against the current working directory,
    /// with the same normalization as directory registration, so the key
    /// matches what resolution produces.
    pub fn handle(&mut self, file: impl AsRef<Path>, handler: impl Handler) {
        let path = registry::normalize(file.as_ref().to_path_buf());
        self.handlers.insert(path, Box::new(handler));
    }

    /// Maps a request to a [`DispatchContext`].
    ///
    /// Fails with [`Error::NoDirectories`] when nothing is registered and
    /// [`Error::UnresolvedPath`] when no directory resolves the path, not
    /// even to a `_default` fallback.
    pub fn dispatch(&self, method: &str, url: &str) -> Result<DispatchContext> {
        if self.registry.is_empty() {
            return Err(Error::NoDirectories);
        }

        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
        let url = parse_url(url)?;

        let segments = path::clean(&url.path);
        let full_path = format!("/{}", segments.join("/"));
        let resolved = resolve::resolve(&self.registry, &segments, &full_path, &self.handler_ext)?;

        tracing::debug!(
            %method,
            path = %full_path,
            directory = %resolved.directory.path().display(),
            file = ?resolved.file,
            "resolved request"
        );

        Ok(DispatchContext {
            id: self.next_id(),
            method,
            scheme: url
                .scheme
                .unwrap_or_else(|| if self.secure { "https" } else { "http" }.to_owned()),
            host: url.host.unwrap_or_else(|| self.default_host.clone()),
            port: url.port,
            raw_path: url.path,
            query: url.query,
            segments,
            dir: resolved.directory.path().clone(),
            file: resolved.file,
            args: resolved.args,
            extension: resolved.extension,
            handler_ext: self.handler_ext.clone(),
            query_values: None,
            post: None,
            cookies: None,
            headers: None,
            raw_body: None,
            body: None,
            status: None,
            status_message: None,
            response_headers: crate::header::HeaderMap::new(),
            response: None,
            canceled: false,
            global_contexts: Vec::new(),
            internal: false,
        })
    }

    /// Executes a dispatched request and returns its response body.
    ///
    /// With `with_global`, the `_global` cascade runs first and may cancel
    /// the request, in which case the cascade's body is returned and the
    /// target handler never runs. A handler failure propagates as
    /// [`Error::Handler`] without being interpreted.
    pub fn execute(&self, ctx: &mut DispatchContext, with_global: bool) -> Result<Value> {
        let mut stack = ExecutionStack::new();
        self.execute_on(ctx, &mut stack, with_global)
    }

    pub(crate) fn execute_on(
        &self,
        ctx: &mut DispatchContext,
        stack: &mut ExecutionStack,
        with_global: bool,
    ) -> Result<Value> {
        ctx.ensure_containers();

        if with_global {
            self.run_cascade(ctx, stack)?;
            if ctx.canceled {
                tracing::debug!(file = %ctx.file().display(), "request canceled by global handler");
                return Ok(ctx.response.clone().unwrap_or(Value::Null));
            }
        }

        self.invoke(ctx, stack)?;
        Ok(ctx.response.clone().unwrap_or(Value::Null))
    }

    /// Walks `_global` handlers from the resolution's root down to the
    /// matched file's containing directory, in order.
    fn run_cascade(&self, ctx: &mut DispatchContext, stack: &mut ExecutionStack) -> Result<()> {
        for level in 0..ctx.file.len() {
            let mut location = ctx.dir().to_path_buf();
            location.extend(ctx.file[..level].iter());
            if !location
                .join(format!("{}.{}", GLOBAL_MARKER, self.handler_ext))
                .is_file()
            {
                continue;
            }

            let mut file = ctx.file[..level].to_vec();
            file.push(GLOBAL_MARKER.to_owned());
            let mut child = ctx.global_child(self.next_id(), file);

            tracing::debug!(file = %child.file().display(), "invoking global handler");
            self.invoke(&mut child, stack)?;

            if let Some(code) = child.status_code() {
                let message = child.status_message().unwrap_or("").to_owned();
                ctx.set_status_code_with_message(code, message);
            }

            let cancel = child
                .response
                .as_ref()
                .map_or(false, |value| !value_is_empty(value))
                || child
                    .status_code()
                    .map_or(false, |code| (400..600).contains(&code));
            let body = child.response.clone();
            ctx.global_contexts.push(child);

            if cancel {
                ctx.canceled = true;
                ctx.response = body;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Executes one resolved handler and interprets its return value.
    fn invoke(&self, ctx: &mut DispatchContext, stack: &mut ExecutionStack) -> Result<()> {
        let file = ctx.absolute_file();
        let handler = self
            .handlers
            .get(&file)
            .ok_or_else(|| Error::MissingHandler { path: file.clone() })?;
        let base_dir = file
            .parent()
            .map_or_else(|| ctx.dir().to_path_buf(), Path::to_path_buf);

        stack.push(Frame::new(ctx.id, file));
        let mut scope = Scope {
            router: self,
            ctx: &mut *ctx,
            stack: &mut *stack,
            base_dir,
            output: String::new(),
        };
        let result = handler.call(&mut scope);
        let Scope { output, .. } = scope;
        stack.pop();

        let value = result.map_err(Error::Handler)?;
        let captured = if output.is_empty() {
            None
        } else {
            Some(output)
        };

        let status_return = match &value {
            Value::Number(number) => number.as_i64().filter(|code| (100..600).contains(code)),
            _ => None,
        };

        if let Some(code) = status_return {
            ctx.set_status_code(code as u16);
            ctx.response = captured.map(Value::String);
        } else if !value_is_empty(&value) {
            ctx.response = Some(value);
        } else {
            ctx.response = captured.map(Value::String);
        }

        if ctx.status_code().is_none() {
            ctx.set_status_code(200);
        }

        Ok(())
    }

    fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// What a handler executes against: its [`DispatchContext`], the
/// execution stack, and the captured-output side channel.
///
/// Output written with [`write`](Scope::write) (or the [`std::fmt::Write`]
/// impl) is captured by the invoker: it becomes the response body when the
/// handler returns a status code or nothing at all.
pub struct Scope<'a> {
    router: &'a Router,
    ctx: &'a mut DispatchContext,
    stack: &'a mut ExecutionStack,
    base_dir: PathBuf,
    output: String,
}

impl Scope<'_> {
    /// The context of the request being handled.
    pub fn context(&mut self) -> &mut DispatchContext {
        self.ctx
    }

    /// The router executing this handler.
    pub fn router(&self) -> &Router {
        self.router
    }

    /// The directory containing the executing handler file, for resolving
    /// sibling files by relative path.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The execution stack this handler runs on. Its top frame is the
    /// handler itself.
    pub fn stack(&self) -> &ExecutionStack {
        self.stack
    }

    /// Appends text to the captured output.
    pub fn write(&mut self, text: impl AsRef<str>) {
        self.output.push_str(text.as_ref());
    }

    /// Whether the executing context belongs to the main request.
    pub fn is_main_request(&self) -> bool {
        self.stack.is_main(self.ctx.id)
    }

    /// Whether the executing context belongs to an internal request.
    pub fn is_internal_request(&self) -> bool {
        !self.is_main_request()
    }

    /// The number of nested invocations in flight, the current one
    /// included.
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Dispatches and executes an internal request on the same execution
    /// stack, returning its executed context.
    pub fn internal(&mut self, method: &str, url: &str) -> Result<DispatchContext> {
        let mut child = self.router.dispatch(method, url)?;
        child.internal = true;
        self.router.execute_on(&mut child, self.stack, true)?;
        Ok(child)
    }
}

impl fmt::Write for Scope<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s);
        Ok(())
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("file", &self.ctx.file())
            .field("depth", &self.stack.depth())
            .finish()
    }
}

fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

struct ParsedUrl {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: String,
    query: String,
}

/// Parses an absolute or relative request URL.
///
/// Anything without a scheme is treated as path-and-query, the way a
/// transport supplies a request target; a missing leading `/` is allowed.
fn parse_url(url: &str) -> Result<ParsedUrl> {
    if url.contains("://") {
        let uri: Uri = url.parse()?;
        Ok(ParsedUrl {
            scheme: uri.scheme_str().map(str::to_owned),
            host: uri.host().map(str::to_owned),
            port: uri.port_u16(),
            path: uri.path().to_owned(),
            query: uri.query().unwrap_or("").to_owned(),
        })
    } else {
        let rooted;
        let target = if url.starts_with('/') {
            url
        } else {
            rooted = format!("/{}", url);
            &rooted
        };
        let uri: Uri = target.parse()?;
        Ok(ParsedUrl {
            scheme: None,
            host: None,
            port: None,
            path: uri.path().to_owned(),
            query: uri.query().unwrap_or("").to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_url, value_is_empty};
    use crate::handler::Value;

    #[test]
    fn absolute_url() {
        let url = parse_url("https://test.com:8443/a/b?x=1").unwrap();
        assert_eq!(url.scheme.as_deref(), Some("https"));
        assert_eq!(url.host.as_deref(), Some("test.com"));
        assert_eq!(url.port, Some(8443));
        assert_eq!(url.path, "/a/b");
        assert_eq!(url.query, "x=1");
    }

    #[test]
    fn relative_url_without_leading_slash() {
        let url = parse_url("test.html?x=1").unwrap();
        assert_eq!(url.scheme, None);
        assert_eq!(url.host, None);
        assert_eq!(url.path, "/test.html");
        assert_eq!(url.query, "x=1");
    }

    #[test]
    fn empty_bodies() {
        assert!(value_is_empty(&Value::Null));
        assert!(value_is_empty(&Value::from("")));
        assert!(!value_is_empty(&Value::from("x")));
        assert!(!value_is_empty(&Value::from(0)));
        assert!(!value_is_empty(&Value::Bool(false)));
    }

    #[test]
    fn bare_host() {
        let url = parse_url("http://test.com").unwrap();
        assert_eq!(url.host.as_deref(), Some("test.com"));
        assert!(crate::path::clean(&url.path).is_empty());
    }
}
