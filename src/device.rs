//! Tuner device-mode configuration
//!
//! Multi-standard tuners must be switched to the broadcast standard before
//! tuning. This runs the vendor control program once at startup
//! (`mediaclient -D <MODE>`); the server only starts if it succeeds.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Default control program
pub const DEFAULT_CONTROL_PROGRAM: &str = "/opt/bin/mediaclient";

/// Digital TV broadcast standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DtvMode {
    /// DVB-T, terrestrial
    #[value(name = "DVBT")]
    Dvbt,
    /// DVB-C, cable
    #[value(name = "DVBC")]
    Dvbc,
    /// ATSC
    #[value(name = "ATSC")]
    Atsc,
    /// ISDB-T
    #[default]
    #[value(name = "ISDBT")]
    Isdbt,
}

impl DtvMode {
    /// Mode string passed to the control program
    pub fn as_str(&self) -> &'static str {
        match self {
            DtvMode::Dvbt => "DVBT",
            DtvMode::Dvbc => "DVBC",
            DtvMode::Atsc => "ATSC",
            DtvMode::Isdbt => "ISDBT",
        }
    }
}

impl fmt::Display for DtvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot device-mode switch
#[derive(Debug, Clone)]
pub struct DeviceControl {
    /// Control program path
    pub program: PathBuf,
    /// Mode to set
    pub mode: DtvMode,
}

impl DeviceControl {
    pub fn new(program: impl Into<PathBuf>, mode: DtvMode) -> Self {
        Self {
            program: program.into(),
            mode,
        }
    }

    /// Run the control program, returning its standard output on success
    pub async fn apply(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-D")
            .arg(self.mode.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .output()
            .await
            .map_err(|source| Error::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::DeviceMode {
                mode: self.mode.to_string(),
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::info!(mode = %self.mode, output = %stdout, "Device mode set");
        Ok(stdout)
    }
}

impl Default for DeviceControl {
    fn default() -> Self {
        Self::new(DEFAULT_CONTROL_PROGRAM, DtvMode::default())
    }
}
