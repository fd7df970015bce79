//! Out-of-process worker supervision
//!
//! Each iteration spawns a server and a client worker. Output streams are
//! always captured, never inherited, so concurrently-running workers
//! cannot interleave on the harness's terminal and a dead worker's stderr
//! can be surfaced in its failure record.
//!
//! Teardown is best-effort: graceful termination, a bounded wait, then a
//! force kill. Its outcome is reported as a value and logged, never as an
//! error, because it always runs on a cleanup path that must complete.

use ferrobench_common::{BenchError, Result};
use std::fmt;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

/// Which half of the tunnel pair a worker is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRole {
    Server,
    Client,
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkerRole::Server => "server",
            WorkerRole::Client => "client",
        })
    }
}

/// How readiness is established after spawning a worker
#[derive(Debug, Clone, Copy)]
pub enum Readiness {
    /// Fixed settle delay followed by a single liveness poll.
    ///
    /// A slow-starting server can race the client under this strategy; it
    /// is kept as the default because it needs no knowledge of the
    /// worker's listener behavior.
    Settle(Duration),
    /// Actively probe the worker's listen port until it accepts a
    /// connection or the timeout elapses.
    Probe { timeout: Duration },
}

/// Lifecycle state of a supervised worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Starting,
    Ready,
    StartFailed,
    Terminated,
}

/// How one teardown attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// Exited within the grace window after the termination request
    Graceful,
    /// Ignored the termination request and was killed
    Forced,
    /// Was already gone when teardown ran
    AlreadyExited,
    /// The attempt itself failed; the run continues regardless
    Failed(String),
}

impl fmt::Display for TeardownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownOutcome::Graceful => f.write_str("graceful"),
            TeardownOutcome::Forced => f.write_str("forced"),
            TeardownOutcome::AlreadyExited => f.write_str("already exited"),
            TeardownOutcome::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// A spawned worker process owned by one iteration
#[derive(Debug)]
pub struct WorkerHandle {
    role: WorkerRole,
    program: String,
    child: Option<Child>,
    listen_port: u16,
    spawned_at: Instant,
    state: WorkerState,
}

impl WorkerHandle {
    /// Launch the worker with captured output streams and return
    /// immediately; readiness is checked separately.
    pub fn spawn(command: &[String], role: WorkerRole, listen_port: u16) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| BenchError::ProcessStart {
            role: role.to_string(),
            diagnostic: "empty command line".to_string(),
        })?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BenchError::ProcessStart {
                role: role.to_string(),
                diagnostic: format!("failed to spawn {program}: {e}"),
            })?;

        debug!(
            "Started {} worker {} (pid {:?})",
            role,
            program,
            child.id()
        );

        Ok(Self {
            role,
            program: program.clone(),
            child: Some(child),
            listen_port,
            spawned_at: Instant::now(),
            state: WorkerState::Starting,
        })
    }

    pub fn role(&self) -> WorkerRole {
        self.role
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Time since the worker was spawned.
    pub fn uptime(&self) -> Duration {
        self.spawned_at.elapsed()
    }

    /// Establish readiness per the configured strategy.
    ///
    /// If the process already exited, its captured stderr is surfaced in
    /// the returned error and the handle becomes terminal.
    pub async fn await_ready(&mut self, readiness: &Readiness) -> Result<()> {
        match readiness {
            Readiness::Settle(delay) => {
                sleep(*delay).await;
                self.ensure_alive().await?;
                self.state = WorkerState::Ready;
                Ok(())
            }
            Readiness::Probe { timeout: limit } => {
                let deadline = Instant::now() + *limit;
                loop {
                    self.ensure_alive().await?;
                    if tokio::net::TcpStream::connect(("127.0.0.1", self.listen_port))
                        .await
                        .is_ok()
                    {
                        self.state = WorkerState::Ready;
                        return Ok(());
                    }
                    if Instant::now() >= deadline {
                        self.state = WorkerState::StartFailed;
                        return Err(BenchError::ProcessStart {
                            role: self.role.to_string(),
                            diagnostic: format!(
                                "{} not accepting connections on port {} after {:?}",
                                self.program, self.listen_port, limit
                            ),
                        });
                    }
                    sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }

    async fn ensure_alive(&mut self) -> Result<()> {
        let exited = {
            let child = self.child.as_mut().ok_or_else(|| BenchError::ProcessStart {
                role: self.role.to_string(),
                diagnostic: "worker already released".to_string(),
            })?;
            child.try_wait()?
        };

        match exited {
            None => Ok(()),
            Some(status) => {
                // Exited before the readiness check: surface what it wrote.
                let diagnostic = match self.child.take() {
                    Some(child) => {
                        let output = child.wait_with_output().await?;
                        let stderr = String::from_utf8_lossy(&output.stderr);
                        let stderr = stderr.trim();
                        if stderr.is_empty() {
                            String::from_utf8_lossy(&output.stdout).trim().to_string()
                        } else {
                            stderr.to_string()
                        }
                    }
                    None => String::new(),
                };
                self.state = WorkerState::StartFailed;
                Err(BenchError::ProcessStart {
                    role: self.role.to_string(),
                    diagnostic: format!("exited with {status}: {diagnostic}"),
                })
            }
        }
    }

    /// Terminate the worker: graceful request, bounded wait, then a force
    /// kill. Never fails past this boundary.
    pub async fn teardown(mut self, grace: Duration) -> TeardownOutcome {
        let Some(mut child) = self.child.take() else {
            self.state = WorkerState::Terminated;
            return TeardownOutcome::AlreadyExited;
        };

        match child.try_wait() {
            Ok(Some(_)) => {
                self.state = WorkerState::Terminated;
                return TeardownOutcome::AlreadyExited;
            }
            Ok(None) => {}
            Err(e) => {
                let _ = child.start_kill();
                self.state = WorkerState::Terminated;
                return TeardownOutcome::Failed(e.to_string());
            }
        }

        request_graceful(&child);

        let outcome = match timeout(grace, child.wait()).await {
            Ok(Ok(_status)) => TeardownOutcome::Graceful,
            Ok(Err(e)) => TeardownOutcome::Failed(e.to_string()),
            Err(_) => match child.kill().await {
                Ok(()) => TeardownOutcome::Forced,
                Err(e) => TeardownOutcome::Failed(e.to_string()),
            },
        };

        self.state = WorkerState::Terminated;
        info!("Tore down {} worker ({})", self.role, outcome);
        outcome
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        // Backstop for abandoned handles (panic or cancelled iteration).
        if let Some(child) = &mut self.child {
            let _ = child.start_kill();
        }
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn request_graceful(child: &Child) {
    if let Some(pid) = child.id() {
        // SAFETY: signalling a pid we spawned and still hold the handle for.
        unsafe {
            libc::kill(pid as i32, libc::SIGTERM);
        }
    }
}

#[cfg(not(unix))]
fn request_graceful(_child: &Child) {
    // No graceful termination channel; teardown proceeds to the force kill.
}
