//! Modern-codec (AVIF) encoding through an external process.
//!
//! The encoder works from the *original* source, not from the fallback
//! thumbnail, so the AVIF never inherits the fallback's compression. The crop
//! and scale are expressed as an ffmpeg filter graph built from the same
//! [`CropPlan`] the raster backend used:
//!
//! | Plan | Filter |
//! |---|---|
//! | Outbound | `crop=W:H:X:Y,scale=TW:TH` |
//! | Inset, width auto | `scale=-1:min(H\,in_h)` |
//! | Inset, height auto | `scale=min(W\,in_w):-1` |
//!
//! A non-zero exit is an expected outcome (e.g. the codec rejects the
//! content) and is reported as [`EncodeStatus::Failed`], never as an error.
//! Only failing to start the process at all is an [`EncoderError`].

use crate::imaging::{CropPlan, InsetScale};
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// File extension of the modern artifact.
pub const AVIF_EXTENSION: &str = "avif";

/// How often a running encoder is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Encoder `{}` could not be started: {source}", program.display())]
    Unavailable {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("IO error while running encoder: {0}")]
    Io(#[from] io::Error),
}

/// Result of one encode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeStatus {
    Success,
    /// Process exited unsuccessfully; `code` is `None` when killed by a signal.
    Failed { code: Option<i32>, stderr: String },
    /// Process exceeded the timeout and was killed.
    TimedOut,
}

impl EncodeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, EncodeStatus::Success)
    }
}

/// One modern-codec artifact to produce.
#[derive(Debug, Clone, Copy)]
pub struct EncodeJob<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    pub plan: CropPlan,
}

/// Producer of the modern-codec artifact.
pub trait ModernEncoder: Send + Sync {
    /// Extension appended to the fallback file name.
    fn extension(&self) -> &str;

    fn encode(&self, job: &EncodeJob<'_>) -> Result<EncodeStatus, EncoderError>;
}

/// Build the ffmpeg filter expression for a plan.
pub fn filter_expression(plan: &CropPlan) -> String {
    match plan {
        CropPlan::Outbound {
            crop,
            width,
            height,
        } => format!(
            "crop={}:{}:{}:{},scale={}:{}",
            crop.width, crop.height, crop.x, crop.y, width, height
        ),
        CropPlan::Inset(InsetScale::AutoWidth { max_height }) => {
            format!(r"scale=-1:min({}\,in_h)", max_height)
        }
        CropPlan::Inset(InsetScale::AutoHeight { max_width }) => {
            format!(r"scale=min({}\,in_w):-1", max_width)
        }
    }
}

/// A process invocation as a program plus argument list.
///
/// Arguments are handed to the OS verbatim; nothing goes through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

/// `ffmpeg`-compatible still-picture encoder.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    command: PathBuf,
    codec: String,
    timeout: Duration,
}

impl FfmpegEncoder {
    pub fn new(command: impl Into<PathBuf>, codec: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            codec: codec.into(),
            timeout,
        }
    }

    /// Whether the encoder executable can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    pub fn invocation(&self, job: &EncodeJob<'_>) -> Invocation {
        let args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            job.source.as_os_str().to_os_string(),
            "-vf".into(),
            filter_expression(&job.plan).into(),
            "-c:v".into(),
            self.codec.clone().into(),
            "-still-picture".into(),
            "1".into(),
            "-y".into(),
            job.output.as_os_str().to_os_string(),
        ];
        Invocation {
            program: self.command.clone(),
            args,
        }
    }
}

impl ModernEncoder for FfmpegEncoder {
    fn extension(&self) -> &str {
        AVIF_EXTENSION
    }

    fn encode(&self, job: &EncodeJob<'_>) -> Result<EncodeStatus, EncoderError> {
        run_with_timeout(&self.invocation(job), self.timeout)
    }
}

/// Run an invocation, killing it once `timeout` has elapsed.
pub fn run_with_timeout(
    invocation: &Invocation,
    timeout: Duration,
) -> Result<EncodeStatus, EncoderError> {
    debug!(program = %invocation.program.display(), args = ?invocation.args, "spawning encoder");

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| EncoderError::Unavailable {
            program: invocation.program.clone(),
            source,
        })?;

    // Drain stderr on a separate thread so a chatty encoder never blocks on a full pipe
    let stderr = child.stderr.take();
    let stderr_reader = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if started.elapsed() >= timeout => break None,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                reap(&mut child);
                return Err(e.into());
            }
        }
    };

    let Some(status) = status else {
        warn!(
            program = %invocation.program.display(),
            timeout_secs = timeout.as_secs_f64(),
            "encoder timed out, killing"
        );
        reap(&mut child);
        // Grandchildren may still hold the pipe open; leave the reader detached
        drop(stderr_reader);
        return Ok(EncodeStatus::TimedOut);
    };

    let stderr = stderr_reader.join().unwrap_or_default();
    if status.success() {
        Ok(EncodeStatus::Success)
    } else {
        Ok(EncodeStatus::Failed {
            code: status.code(),
            stderr: stderr.trim().to_string(),
        })
    }
}

/// Kill `child` and wait for it so no zombie is left behind.
///
/// The child may already have exited, so kill errors are ignored.
fn reap(child: &mut Child) {
    let _ = child.kill();
    if let Err(e) = child.wait() {
        warn!(pid = child.id(), error = %e, "could not reap encoder process");
    }
}
