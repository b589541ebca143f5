//! External process launching.
//!
//! A [`RenderCommand`] is an explicit argument vector plus working
//! directory; no shell is involved. [`ProcessLauncher`] is the seam that
//! lets tests stand in for the real renderer.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use texbake_common::error::{TexbakeError, TexbakeResult};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A fully specified process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,

    /// Interleave stderr lines with stdout lines in the output stream.
    pub merge_stderr: bool,

    /// Kill the process once this much time has passed.
    pub timeout: Option<Duration>,
}

impl RenderCommand {
    /// Program followed by its arguments, as the OS sees them.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// How a launched process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code; `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub output_lines: usize,
    pub elapsed: Duration,
}

impl ExitReport {
    fn from_status(status: ExitStatus, output_lines: usize, elapsed: Duration) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
            output_lines,
            elapsed,
        }
    }
}

/// Which stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Runs commands to completion, streaming output lines to a sink.
pub trait ProcessLauncher: Send + Sync {
    /// Launch `command` and block until it exits or times out.
    ///
    /// Every output line is handed to `sink` as it arrives. A timeout kills
    /// the process and returns [`TexbakeError::RenderTimeout`].
    fn launch(
        &self,
        command: &RenderCommand,
        sink: &mut dyn FnMut(OutputStream, &str),
    ) -> TexbakeResult<ExitReport>;
}

/// Launches real OS processes via `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(
        &self,
        command: &RenderCommand,
        sink: &mut dyn FnMut(OutputStream, &str),
    ) -> TexbakeResult<ExitReport> {
        let started = Instant::now();
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(if command.merge_stderr {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd.spawn().map_err(|e| {
            TexbakeError::Other(anyhow::anyhow!(
                "failed to start {}: {e}",
                command.program.display()
            ))
        })?;

        tracing::info!(
            pid = child.id(),
            program = %command.program.display(),
            "Renderer process started"
        );

        // Both pipes are drained on their own threads so a chatty stream can
        // never fill its OS buffer and stall the child.
        let (tx, rx) = mpsc::channel::<(OutputStream, String)>();
        let mut readers: Vec<JoinHandle<()>> = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, OutputStream::Stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, OutputStream::Stderr, tx.clone()));
        }
        drop(tx);

        let deadline = command.timeout.map(|t| started + t);
        let mut output_lines = 0usize;
        let mut exited = None;
        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok((stream, line)) => {
                    output_lines += 1;
                    sink(stream, &line);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    for reader in readers.drain(..) {
                        let _ = reader.join();
                    }
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Output has gone quiet. If the renderer itself is gone, a
                    // grandchild may be holding the pipes; stop waiting on them.
                    if let Some(status) = child.try_wait()? {
                        if !readers.is_empty() {
                            tracing::debug!(pid = child.id(), "Renderer exited with pipes still open");
                        }
                        exited = Some(status);
                        break;
                    }
                }
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(kill_on_timeout(&mut child, command));
            }
        }

        while let Ok((stream, line)) = rx.try_recv() {
            output_lines += 1;
            sink(stream, &line);
        }

        // Output is done, but the process may still be running.
        let status = loop {
            if let Some(status) = exited.take() {
                break status;
            }
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(kill_on_timeout(&mut child, command));
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        Ok(ExitReport::from_status(
            status,
            output_lines,
            started.elapsed(),
        ))
    }
}

fn spawn_line_reader<R: Read + Send + 'static>(
    reader: R,
    stream: OutputStream,
    tx: mpsc::Sender<(OutputStream, String)>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\r', '\n']);
                    if tx.send((stream, line.to_string())).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send((stream, format!("<failed to read output: {err}>")));
                    break;
                }
            }
        }
    })
}

// Reader threads are left detached: a grandchild may still hold the pipes
// open, and they exit on their own once the pipes close.
fn kill_on_timeout(child: &mut Child, command: &RenderCommand) -> TexbakeError {
    let limit = command.timeout.unwrap_or_default();
    tracing::error!(
        pid = child.id(),
        limit_secs = limit.as_secs_f64(),
        "Renderer exceeded time limit; killing"
    );
    if let Err(e) = child.kill() {
        tracing::warn!(error = %e, "Failed to kill renderer");
    }
    let _ = child.wait();
    TexbakeError::RenderTimeout {
        limit_secs: limit.as_secs(),
    }
}
