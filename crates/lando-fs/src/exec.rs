//! Executable descriptor runner
//!
//! An `.exec` descriptor is any executable file. It is run with a JSON
//! context on stdin and whatever it prints on stdout is parsed as a tree.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use serde_json::Value;

use crate::{Error, Format, Result};

/// Run an executable descriptor and parse its output.
///
/// The working directory is the descriptor's parent so relative paths
/// printed by the descriptor resolve the same way they do for static files.
pub fn run_descriptor(path: &Path, context: &Value) -> Result<Value> {
    let input = serde_json::to_vec(context).map_err(|e| Error::Serialize {
        path: path.to_path_buf(),
        format: "JSON".into(),
        message: e.to_string(),
    })?;

    let mut cmd = Command::new(crate::path::canonical(path));
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    tracing::debug!(path = %path.display(), "Running executable descriptor");
    let mut child = cmd.spawn().map_err(|e| Error::io(path, e))?;

    // Stdin is fed from its own thread; descriptors may print while reading.
    let writer = child.stdin.take().map(|mut stdin| {
        thread::spawn(move || match stdin.write_all(&input) {
            // Descriptors that ignore their context close stdin early
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        })
    });

    let output = child.wait_with_output().map_err(|e| Error::io(path, e))?;
    let written = writer.map(|w| {
        w.join()
            .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")))
    });
    if !output.status.success() {
        return Err(Error::DescriptorFailed {
            path: path.to_path_buf(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    if let Some(Err(e)) = written {
        return Err(Error::io(path, e));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Format::Executable.parse(path, &stdout)
}
