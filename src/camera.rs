// Camera module: grabs a single still frame for the capture flow.
//
// The terminal client has no live video element, so a frame is taken by
// running an external capture command that writes one encoded image to
// stdout. Any failure to get a frame (no device, missing program, empty
// output) is reported as "no frame", never as a crash.

use anyhow::Result;
use std::io::ErrorKind;
use std::process::{Command, Stdio};

use crate::selection::sniff_mime;

/// Format frames are assumed to be in when the bytes cannot be sniffed.
const FALLBACK_MIME: &str = "image/jpeg";

/// One encoded still frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Something that can produce a still frame on demand.
pub trait Camera {
    /// Returns `Ok(None)` when no frame is available.
    fn capture_frame(&self) -> Result<Option<CapturedFrame>>;
}

/// Camera backed by an external command writing one frame to stdout.
#[derive(Debug, Clone)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Create a camera from the `CAMERA_COMMAND` environment variable
    /// (whitespace separated) or fall back to a one-frame ffmpeg grab.
    pub fn from_env() -> Self {
        match std::env::var("CAMERA_COMMAND") {
            Ok(cmd) if !cmd.trim().is_empty() => {
                let mut parts = cmd.split_whitespace().map(str::to_string);
                // non-empty after trim, so there is at least one part
                let program = parts.next().unwrap_or_default();
                Self::new(program, parts.collect())
            }
            _ => Self::default(),
        }
    }

    /// Human readable form of the command, for messages.
    pub fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for CommandCamera {
    fn default() -> Self {
        let args = [
            "-loglevel", "error", "-f", "v4l2", "-i", "/dev/video0", "-frames:v", "1", "-f",
            "image2", "-c:v", "mjpeg", "-",
        ];
        Self::new("ffmpeg", args.iter().map(|s| s.to_string()).collect())
    }
}

impl Camera for CommandCamera {
    fn capture_frame(&self) -> Result<Option<CapturedFrame>> {
        let output = match Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("camera command `{}` not found", self.program);
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!("failed to run camera command `{}`: {}", self.describe(), e);
                return Ok(None);
            }
        };

        if !output.status.success() {
            tracing::warn!(
                "camera command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }
        if output.stdout.is_empty() {
            tracing::warn!("camera command produced no frame");
            return Ok(None);
        }

        let mime = sniff_mime(&output.stdout).unwrap_or(FALLBACK_MIME).to_string();
        tracing::debug!("captured {} byte frame ({})", output.stdout.len(), mime);
        Ok(Some(CapturedFrame {
            bytes: output.stdout,
            mime,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_yields_no_frame() {
        let camera = CommandCamera::new("emotion-capture-no-such-camera", vec![]);
        assert_eq!(camera.capture_frame().unwrap(), None);
    }

    #[test]
    fn test_describe_joins_args() {
        let camera = CommandCamera::new("grab", vec!["-n".into(), "1".into()]);
        assert_eq!(camera.describe(), "grab -n 1");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_yields_no_frame() {
        let camera = CommandCamera::new("false", vec![]);
        assert_eq!(camera.capture_frame().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_output_yields_no_frame() {
        let camera = CommandCamera::new("true", vec![]);
        assert_eq!(camera.capture_frame().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_frame_from_stdout() {
        let camera = CommandCamera::new("printf", vec!["\\211PNG\\r\\n\\032\\n".into()]);
        let frame = camera.capture_frame().unwrap().unwrap();
        assert_eq!(frame.mime, "image/png");
        assert_eq!(&frame.bytes[..4], b"\x89PNG");
    }
}
