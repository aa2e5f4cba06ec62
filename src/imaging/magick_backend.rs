//! ImageMagick / GraphicsMagick backend.
//!
//! Both tools accept the same `-crop` / `-resize` geometry syntax, so one
//! backend drives either, differing only in how they are invoked:
//!
//! | Flavor | Identify | Convert | Probe |
//! |---|---|---|---|
//! | ImageMagick 7 | `magick identify` | `magick <src> ... <dst>` | `magick -version` |
//! | GraphicsMagick | `gm identify` | `gm convert <src> ... <dst>` | `gm version` |
//!
//! Arguments are always passed as a list, never through a shell.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::CropPlan;
use super::params::ThumbnailParams;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagickFlavor {
    ImageMagick,
    GraphicsMagick,
}

impl MagickFlavor {
    fn program(self) -> &'static str {
        match self {
            MagickFlavor::ImageMagick => "magick",
            MagickFlavor::GraphicsMagick => "gm",
        }
    }

    fn version_arg(self) -> &'static str {
        match self {
            MagickFlavor::ImageMagick => "-version",
            MagickFlavor::GraphicsMagick => "version",
        }
    }
}

pub struct MagickBackend {
    flavor: MagickFlavor,
    program: PathBuf,
}

impl MagickBackend {
    pub fn new(flavor: MagickFlavor) -> Self {
        Self {
            flavor,
            program: PathBuf::from(flavor.program()),
        }
    }

    /// Probe: the tool runs and reports its version.
    pub fn is_available(flavor: MagickFlavor) -> bool {
        Command::new(flavor.program())
            .arg(flavor.version_arg())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null());
        cmd
    }
}

/// Arguments for `identify`, including the sub-command.
fn identify_args(source: &Path) -> Vec<OsString> {
    vec![
        "identify".into(),
        "-format".into(),
        "%w %h".into(),
        first_frame(source),
    ]
}

/// Arguments for the conversion, including the GraphicsMagick sub-command.
fn convert_args(
    flavor: MagickFlavor,
    params: &ThumbnailParams,
    output_size: Dimensions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    if flavor == MagickFlavor::GraphicsMagick {
        args.push("convert".into());
    }
    args.push(first_frame(&params.source));
    if let CropPlan::Outbound { crop, .. } = params.plan {
        args.push("-crop".into());
        args.push(format!("{}x{}+{}+{}", crop.width, crop.height, crop.x, crop.y).into());
        args.push("+repage".into());
    }
    args.push("-resize".into());
    args.push(format!("{}x{}!", output_size.width, output_size.height).into());
    args.push("-quality".into());
    args.push(params.quality.value().to_string().into());
    args.push(params.output.clone().into_os_string());
    args
}

/// Restrict multi-frame inputs to their first frame.
fn first_frame(source: &Path) -> OsString {
    let mut s = source.as_os_str().to_os_string();
    s.push("[0]");
    s
}

fn parse_dimensions(stdout: &str) -> Option<Dimensions> {
    let mut parts = stdout.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    Some(Dimensions { width, height })
}

impl ImageBackend for MagickBackend {
    fn name(&self) -> &'static str {
        match self.flavor {
            MagickFlavor::ImageMagick => "imagemagick",
            MagickFlavor::GraphicsMagick => "graphicsmagick",
        }
    }

    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let output = self.command().args(identify_args(path)).output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            return Err(BackendError::DecodeFailed {
                path: path.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_dimensions(&stdout).ok_or_else(|| BackendError::DecodeFailed {
            path: path.to_path_buf(),
            message: format!("unexpected identify output: {}", stdout.trim()),
        })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        // Identify doubles as the decode check, so a failing conversion
        // afterwards is reported against the output.
        let source = self.identify(&params.source)?;
        let args = convert_args(self.flavor, params, params.plan.output_size(source));
        debug!(backend = self.name(), ?args, "converting");

        let output = self.command().args(&args).output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(BackendError::WriteFailed {
                path: params.output.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
