//! The `_global` cascade: ordering, status propagation and cancellation.

use std::sync::{Arc, Mutex};

use trellis::test::{self, Site};
use trellis::{BoxError, Directory, Router, Scope, Value};

type Log = Arc<Mutex<Vec<&'static str>>>;

/// A handler that records its label and returns nothing.
fn record(log: &Log, label: &'static str) -> impl trellis::Handler {
    let log = Arc::clone(log);
    move |_: &mut Scope<'_>| -> Result<Value, BoxError> {
        log.lock().unwrap().push(label);
        Ok(Value::Null)
    }
}

/// A site with a `_global` at the root and one in a subdirectory:
///
/// ```text
/// _global.rs
/// _default.rs
/// sub/_global.rs
/// sub/page.rs
/// ```
fn cascade_site(root: &std::path::Path) -> (Site, Router, Log) {
    let site = Site::new(root);
    site.file("_global.rs");
    site.file("_default.rs");
    site.file("sub/_global.rs");
    site.file("sub/page.rs");

    let log: Log = Arc::default();
    let mut router = Router::new();
    router.register(Directory::new(site.root())).unwrap();
    router.handle(site.root().join("_global.rs"), record(&log, "root-global"));
    router.handle(site.root().join("_default.rs"), record(&log, "default"));
    router.handle(
        site.root().join("sub/_global.rs"),
        record(&log, "sub-global"),
    );
    router.handle(site.root().join("sub/page.rs"), record(&log, "page"));

    (site, router, log)
}

#[test]
fn globals_run_root_to_leaf_before_the_target() {
    let tmp = tempfile::tempdir().unwrap();
    let (_site, router, log) = cascade_site(tmp.path());

    let mut ctx = router.dispatch("GET", "/sub/page").unwrap();
    router.execute(&mut ctx, true).unwrap();

    assert_eq!(*log.lock().unwrap(), ["root-global", "sub-global", "page"]);
    assert!(!ctx.canceled());

    let files: Vec<_> = ctx
        .global_contexts()
        .iter()
        .map(|global| global.file())
        .collect();
    assert_eq!(
        files,
        [
            std::path::PathBuf::from("_global.rs"),
            std::path::PathBuf::from("sub/_global.rs"),
        ]
    );
}

#[test]
fn only_globals_above_the_target_run() {
    let tmp = tempfile::tempdir().unwrap();
    let (_site, router, log) = cascade_site(tmp.path());

    // `/other` resolves to the root `_default`, so `sub/_global` is
    // outside the cascade even though a deeper directory exists.
    let mut ctx = router.dispatch("GET", "/other").unwrap();
    router.execute(&mut ctx, true).unwrap();

    assert_eq!(*log.lock().unwrap(), ["root-global", "default"]);
    assert_eq!(ctx.global_contexts().len(), 1);
}

#[test]
fn global_body_cancels_the_request() {
    let tmp = tempfile::tempdir().unwrap();
    let (site, router, log) = cascade_site(tmp.path());

    let mut router = router;
    router.handle(site.root().join("_global.rs"), test::text("Error"));

    let mut ctx = router.dispatch("GET", "/sub/page").unwrap();
    let body = router.execute(&mut ctx, true).unwrap();

    // Neither the deeper global nor the target ran.
    assert!(log.lock().unwrap().is_empty());
    assert!(ctx.canceled());
    assert_eq!(body, Value::from("Error"));
    // Cancellation by body is not an error condition.
    assert_eq!(ctx.status_code(), Some(200));
    assert_eq!(ctx.status_message(), Some("OK"));
}

#[test]
fn global_error_status_cancels_the_request() {
    let tmp = tempfile::tempdir().unwrap();
    let (site, router, log) = cascade_site(tmp.path());

    let mut router = router;
    router.handle(site.root().join("sub/_global.rs"), test::status(400));

    let mut ctx = router.dispatch("GET", "/sub/page").unwrap();
    let body = router.execute(&mut ctx, true).unwrap();

    assert_eq!(*log.lock().unwrap(), ["root-global"]);
    assert!(ctx.canceled());
    assert_eq!(body, Value::Null);
    assert_eq!(ctx.status_code(), Some(400));
    assert_eq!(ctx.status_message(), Some("Bad Request"));
}

#[test]
fn global_status_below_400_propagates_without_canceling() {
    let tmp = tempfile::tempdir().unwrap();
    let (site, router, log) = cascade_site(tmp.path());

    let mut router = router;
    router.handle(site.root().join("_global.rs"), test::status(301));

    let mut ctx = router.dispatch("GET", "/sub/page").unwrap();
    router.execute(&mut ctx, true).unwrap();

    assert_eq!(*log.lock().unwrap(), ["sub-global", "page"]);
    assert!(!ctx.canceled());
    assert_eq!(ctx.status_code(), Some(301));
    assert_eq!(ctx.status_message(), Some("Moved Permanently"));
}

#[test]
fn empty_global_output_does_not_cancel() {
    let tmp = tempfile::tempdir().unwrap();
    let (site, router, _log) = cascade_site(tmp.path());

    let mut router = router;
    // An explicit empty string is as empty as no body at all.
    router.handle(site.root().join("_global.rs"), test::text(""));
    router.handle(site.root().join("sub/page.rs"), test::text("page"));

    let mut ctx = router.dispatch("GET", "/sub/page").unwrap();
    let body = router.execute(&mut ctx, true).unwrap();

    assert!(!ctx.canceled());
    assert_eq!(body, Value::from("page"));
}

#[test]
fn skipping_the_cascade_runs_only_the_target() {
    let tmp = tempfile::tempdir().unwrap();
    let (_site, router, log) = cascade_site(tmp.path());

    let mut ctx = router.dispatch("GET", "/sub/page").unwrap();
    router.execute(&mut ctx, false).unwrap();

    assert_eq!(*log.lock().unwrap(), ["page"]);
    assert!(ctx.global_contexts().is_empty());
}
