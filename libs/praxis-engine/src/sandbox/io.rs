//! Per-thread session I/O.
//!
//! Native builtins are plain function pointers, so the output sink and input
//! queue of the running session live in thread-local state. A session is
//! always hosted on a single thread for its whole lifetime (the cell's main
//! thread, or one blocking thread inline), which makes this safe and keeps
//! concurrent sessions fully isolated from each other.

use std::cell::RefCell;
use std::collections::VecDeque;

/// Receives every chunk of script output as it is produced, so partial
/// output survives a fault or a kill.
pub type OutputSink = Box<dyn FnMut(&str) + Send>;

struct SessionIo {
    inputs: VecDeque<String>,
    provided: usize,
    sink: OutputSink,
}

thread_local! {
    static SESSION: RefCell<Option<SessionIo>> = const { RefCell::new(None) };
}

/// Installs the I/O state for a new session on this thread, replacing any
/// prior session's leftovers.
pub(crate) fn begin_session(inputs: Vec<String>, sink: OutputSink) {
    let provided = inputs.len();
    SESSION.with(|session| {
        *session.borrow_mut() = Some(SessionIo {
            inputs: inputs.into(),
            provided,
            sink,
        });
    });
}

pub(crate) fn end_session() {
    SESSION.with(|session| {
        *session.borrow_mut() = None;
    });
}

pub(crate) fn write_output(chunk: &str) {
    SESSION.with(|session| {
        if let Some(io) = session.borrow_mut().as_mut() {
            (io.sink)(chunk);
        }
    });
}

/// Consumes the next scripted input value, or `None` when the queue is
/// exhausted.
pub(crate) fn next_input() -> Option<String> {
    SESSION.with(|session| {
        session
            .borrow_mut()
            .as_mut()
            .and_then(|io| io.inputs.pop_front())
    })
}

/// How many input values this session started with. Used to build the
/// exhaustion diagnostic.
pub(crate) fn provided_count() -> usize {
    SESSION.with(|session| {
        session
            .borrow()
            .as_ref()
            .map(|io| io.provided)
            .unwrap_or(0)
    })
}
