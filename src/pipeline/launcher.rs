//! Pipeline launching
//!
//! A pipeline is the tuner feeding the transcoder, plus the transcoder's
//! stdout that the ingestor reads. Launching sits behind a trait so the
//! supervisor can be driven by in-memory feeds.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncRead;
use tokio::process::Child;

use super::command::CommandTemplate;
use crate::error::{Error, Result};

/// Byte source the ingestor reads from
pub type FeedSource = Box<dyn AsyncRead + Send + Unpin>;

/// A named child process of a pipeline
#[derive(Debug)]
pub struct PipelineProcess {
    /// Program name, for diagnostics
    pub name: String,
    child: Child,
}

/// Exit state of one process when the pipeline was found dead
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    pub name: String,
    /// `None` if the process was still running or its status unavailable
    pub status: Option<ExitStatus>,
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}: {}", self.name, status),
            None => write!(f, "{}: running", self.name),
        }
    }
}

/// The processes of one pipeline generation
#[derive(Debug, Default)]
pub struct ProcessSet {
    processes: Vec<PipelineProcess>,
}

impl ProcessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a child process
    pub fn push(&mut self, name: impl Into<String>, child: Child) {
        self.processes.push(PipelineProcess {
            name: name.into(),
            child,
        });
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Non-blocking liveness check
    ///
    /// Returns the state of every process if any of them has exited.
    pub fn poll_exit(&mut self) -> Option<Vec<ProcessExit>> {
        let mut any_exited = false;
        let mut exits = Vec::with_capacity(self.processes.len());

        for process in &mut self.processes {
            let status = match process.child.try_wait() {
                Ok(status) => status,
                Err(e) => {
                    tracing::debug!(process = %process.name, error = %e, "Failed to poll process");
                    any_exited = true;
                    None
                }
            };
            any_exited |= status.is_some();
            exits.push(ProcessExit {
                name: process.name.clone(),
                status,
            });
        }

        any_exited.then_some(exits)
    }

    /// Best-effort kill of every process; never fails
    pub fn kill(&mut self) {
        for process in &mut self.processes {
            if let Err(e) = process.child.start_kill() {
                tracing::debug!(process = %process.name, error = %e, "Kill failed");
            }
        }
    }
}

/// A launched pipeline
pub struct Pipeline {
    /// Child processes to supervise
    pub processes: ProcessSet,
    /// Transcoder output
    pub output: FeedSource,
}

impl Pipeline {
    /// A pipeline with no processes, fed by `output`
    pub fn from_source<R>(output: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            processes: ProcessSet::new(),
            output: Box::new(output),
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("processes", &self.processes)
            .finish_non_exhaustive()
    }
}

/// Starts pipelines for the supervisor
pub trait PipelineLauncher: Send + Sync + 'static {
    /// Launch a pipeline tuned to `channel`
    fn launch(&self, channel: &str) -> Result<Pipeline>;
}

/// Launches the tuner and transcoder as child processes
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    /// Channel-list file handed to the tuner
    pub channels_path: PathBuf,
    /// Tuner command
    pub tuner: CommandTemplate,
    /// Transcoder command
    pub transcoder: CommandTemplate,
}

impl ProcessLauncher {
    /// Launcher using the default tuner and transcoder commands
    pub fn new(channels_path: impl Into<PathBuf>) -> Self {
        Self {
            channels_path: channels_path.into(),
            tuner: CommandTemplate::tuner(),
            transcoder: CommandTemplate::transcoder(),
        }
    }

    /// Set the tuner command
    pub fn tuner(mut self, tuner: CommandTemplate) -> Self {
        self.tuner = tuner;
        self
    }

    /// Set the transcoder command
    pub fn transcoder(mut self, transcoder: CommandTemplate) -> Self {
        self.transcoder = transcoder;
        self
    }

    fn launch_error(template: &CommandTemplate, source: io::Error) -> Error {
        Error::Launch {
            program: template.program.clone(),
            source,
        }
    }
}

impl PipelineLauncher for ProcessLauncher {
    fn launch(&self, channel: &str) -> Result<Pipeline> {
        let mut processes = ProcessSet::new();

        let mut tuner = self
            .tuner
            .command(&self.channels_path, channel)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Self::launch_error(&self.tuner, e))?;

        let tuner_out = tuner.stdout.take();
        processes.push(self.tuner.program.clone(), tuner);

        let tuner_out = tuner_out.map(|out| -> io::Result<Stdio> { out.try_into() });
        let tuner_out = match tuner_out {
            Some(Ok(stdio)) => stdio,
            Some(Err(e)) => {
                processes.kill();
                return Err(Self::launch_error(&self.tuner, e));
            }
            None => {
                processes.kill();
                return Err(Self::launch_error(
                    &self.tuner,
                    io::Error::other("stdout not captured"),
                ));
            }
        };

        let transcoder = self
            .transcoder
            .command(&self.channels_path, channel)
            .stdin(tuner_out)
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut transcoder = match transcoder {
            Ok(child) => child,
            Err(e) => {
                processes.kill();
                return Err(Self::launch_error(&self.transcoder, e));
            }
        };

        let output = transcoder.stdout.take();
        processes.push(self.transcoder.program.clone(), transcoder);

        match output {
            Some(output) => Ok(Pipeline {
                processes,
                output: Box::new(output),
            }),
            None => {
                processes.kill();
                Err(Self::launch_error(
                    &self.transcoder,
                    io::Error::other("stdout not captured"),
                ))
            }
        }
    }
}
