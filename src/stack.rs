//! The execution stack of dispatch contexts.
//!
//! One stack exists per top-level [`Router::execute`](crate::Router::execute)
//! call and is threaded through every handler invocation it causes. The
//! bottom frame belongs to the main request; any deeper frame is an
//! internal request started by a handler.

use std::path::{Path, PathBuf};

/// One entry on the execution stack: the identity of an executing
/// [`DispatchContext`](crate::DispatchContext) and its handler file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub(crate) id: u64,
    pub(crate) file: PathBuf,
}

impl Frame {
    pub(crate) fn new(id: u64, file: PathBuf) -> Self {
        Self { id, file }
    }

    /// The absolute path of the handler file this frame is executing.
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// The ordered list of currently-executing dispatch contexts.
#[derive(Debug, Default)]
pub struct ExecutionStack {
    frames: Vec<Frame>,
}

impl ExecutionStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// The frame currently executing, if any.
    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// The number of nested invocations in flight.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether `id` identifies the main request: the bottom-of-stack entry.
    pub(crate) fn is_main(&self, id: u64) -> bool {
        self.frames.first().map_or(false, |frame| frame.id == id)
    }
}
