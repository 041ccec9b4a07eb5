//! External tool invocation (poppler-utils, tesseract, pandoc, LibreOffice)

use std::ffi::OsStr;
use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::ToolsConfig;
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs external binaries with a wall-clock timeout
#[derive(Debug, Clone)]
pub struct ToolRunner {
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `program` and return its stdout.
    ///
    /// A missing binary maps to [`Error::ToolUnavailable`], a non-zero exit to
    /// [`Error::ToolFailed`] carrying stderr, and an overrun to [`Error::ToolTimeout`]
    /// after the child is killed.
    pub fn run<I, S>(&self, program: &str, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        tracing::debug!(tool = program, "Running external tool");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::ToolUnavailable {
                    tool: program.to_string(),
                },
                _ => Error::tool(program, format!("failed to spawn: {}", e)),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.wait(&mut child) {
            Some(status) => status,
            None => {
                child.kill().ok();
                child.wait().ok();
                tracing::warn!(tool = program, secs = self.timeout.as_secs(), "External tool timed out");
                return Err(Error::ToolTimeout {
                    tool: program.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            let message = String::from_utf8_lossy(&stderr).trim().to_string();
            let message = if message.is_empty() {
                format!("exited with {}", status)
            } else {
                message
            };
            return Err(Error::tool(program, message));
        }

        Ok(stdout)
    }

    /// Run and decode stdout as (lossy) UTF-8
    pub fn run_text<I, S>(&self, program: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let stdout = self.run(program, args)?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    fn wait(&self, child: &mut Child) -> Option<std::process::ExitStatus> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) if started.elapsed() >= self.timeout => return None,
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to poll external tool");
                    return None;
                }
            }
        }
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default())
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).ok();
        }
        buf
    })
}

/// Which external tools are installed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tooling {
    pub pdftotext: bool,
    pub pdftoppm: bool,
    pub pdfimages: bool,
    pub tesseract: bool,
    pub pandoc: bool,
    pub soffice: bool,
}

impl Tooling {
    /// Probe each configured binary once
    pub fn probe(config: &ToolsConfig) -> Self {
        Self {
            pdftotext: is_installed(&config.pdftotext, "-v"),
            pdftoppm: is_installed(&config.pdftoppm, "-v"),
            pdfimages: is_installed(&config.pdfimages, "-v"),
            tesseract: is_installed(&config.tesseract, "--version"),
            pandoc: is_installed(&config.pandoc, "--version"),
            soffice: is_installed(&config.soffice, "--version"),
        }
    }

    /// Native PDF extraction needs word boxes and image export
    pub fn can_extract_pdf(&self) -> bool {
        self.pdftotext && self.pdfimages
    }

    /// Scanned pages need rasterization and OCR
    pub fn can_ocr(&self) -> bool {
        self.pdftoppm && self.tesseract
    }

    /// Names of the tools that were not found
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("pdftotext", self.pdftotext),
            ("pdftoppm", self.pdftoppm),
            ("pdfimages", self.pdfimages),
            ("tesseract", self.tesseract),
            ("pandoc", self.pandoc),
            ("soffice", self.soffice),
        ]
        .into_iter()
        .filter(|(_, found)| !found)
        .map(|(name, _)| name)
        .collect()
    }

    /// Log one warning per capability gap
    pub fn log_gaps(&self) {
        if !self.can_extract_pdf() {
            tracing::warn!("poppler-utils not found - PDF extraction unavailable. Install with: apt install poppler-utils");
        }
        if !self.tesseract {
            tracing::warn!("tesseract not found - scanned pages and images will yield no text. Install with: apt install tesseract-ocr");
        }
        if !self.pandoc {
            tracing::warn!("pandoc not found - structure-aware extraction unavailable");
        }
        if !self.soffice {
            tracing::warn!("LibreOffice not found - office documents cannot be converted to PDF");
        }
    }
}

// Some poppler builds exit non-zero for -v, so spawning is enough
fn is_installed(program: &str, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}
