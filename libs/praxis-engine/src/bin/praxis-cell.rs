//! Execution cell: one sandbox session per process.
//!
//! Reads a single JSON request line from stdin, runs the script in a fresh
//! sandbox, and streams frames to stdout. Every output frame is flushed as
//! it is written so the parent keeps everything produced before a kill. The
//! parent enforces the deadline; the cell itself never times anything.

use std::io::{self, BufRead, Write};

use praxis_engine::cell::{CellRequest, Frame};
use praxis_engine::sandbox::{run_session, OutputSink, SandboxSpec};

fn emit(frame: &Frame) {
    if let Ok(line) = serde_json::to_string(frame) {
        let mut stdout = io::stdout().lock();
        // Ignore write failures: the parent may already be gone.
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }
}

fn main() {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        emit(&Frame::Done {
            ok: false,
            error: "failed to read cell request".to_string(),
        });
        return;
    }

    let request: CellRequest = match serde_json::from_str(line.trim()) {
        Ok(request) => request,
        Err(err) => {
            emit(&Frame::Done {
                ok: false,
                error: format!("malformed cell request: {err}"),
            });
            return;
        }
    };

    let spec = SandboxSpec {
        inputs: request.inputs,
        recursion_limit: request.recursion_limit,
        loop_budget: None,
    };
    let sink: OutputSink = Box::new(|chunk: &str| {
        emit(&Frame::Out {
            chunk: chunk.to_string(),
        });
    });

    match run_session(&request.code, &spec, sink) {
        Ok(()) => emit(&Frame::Done {
            ok: true,
            error: String::new(),
        }),
        Err(diagnostic) => emit(&Frame::Done {
            ok: false,
            error: diagnostic,
        }),
    }
}
