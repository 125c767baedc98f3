//! External compiler invocation.
//!
//! # Protocol
//! The configured program receives the resolved config as JSON on stdin
//! and, on success, prints a JSON object with `output`, `source_map` and
//! `externs` fields on stdout. On failure it exits non-zero with a JSON
//! array of diagnostics on stderr; plain text on stderr is accepted and
//! wrapped into a single diagnostic.
//!
//! # Timeouts
//! Each run is bounded. The child is polled while the deadline is in the
//! future and killed once it passes, so a wedged compiler cannot occupy a
//! worker forever.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::compiler::{Compilation, CompileError, Compiler, Diagnostic};
use crate::config::schema::Config;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A [`Compiler`] that shells out to a configured external program.
pub struct CommandCompiler {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandCompiler {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn wait_with_deadline(&self, child: &mut Child) -> Result<std::process::ExitStatus, CompileError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CompileError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Compiler for CommandCompiler {
    fn compile(&self, config: &Config) -> Result<Compilation, CompileError> {
        let payload = serde_json::to_vec(config)
            .map_err(|e| CompileError::Protocol(format!("config not serializable: {e}")))?;

        let started = Instant::now();
        tracing::debug!(
            config_id = %config.id,
            program = %self.program.display(),
            "Invoking external compiler"
        );

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A write failure here means the child exited early; its exit
            // status carries the real story.
            if let Err(e) = stdin.write_all(&payload) {
                tracing::debug!(config_id = %config.id, error = %e, "Compiler closed stdin early");
            }
        }

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait_with_deadline(&mut child)?;
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        tracing::debug!(
            config_id = %config.id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            exit = %status,
            "External compiler finished"
        );

        if status.success() {
            serde_json::from_str::<Compilation>(&stdout)
                .map_err(|e| CompileError::Protocol(format!("bad success payload: {e}")))
        } else {
            let diagnostics = serde_json::from_str::<Vec<Diagnostic>>(&stderr)
                .unwrap_or_else(|_| {
                    let text = stderr.trim();
                    if text.is_empty() {
                        vec![Diagnostic::message(format!(
                            "compiler exited with {status} and no diagnostics"
                        ))]
                    } else {
                        vec![Diagnostic::message(text)]
                    }
                });
            Err(CompileError::Failed(diagnostics))
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
