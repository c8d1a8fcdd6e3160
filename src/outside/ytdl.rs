use std::{ffi::OsStr, path::Path};

use tracing::debug;

use super::command::{assert_success_command, run_command, Capture, YT_DL, YT_DLP};
use crate::result::{bail, Result};

/// Interface for transferring a clip to a local file
pub trait ClipTransfer {
    /// Download the media at `url` into the file `output`.
    ///
    /// Returning `Ok` means the program reported success, the caller
    /// still checks that the file exists.
    fn download(&self, url: &str, output: &Path) -> Result<()>;
}

/// Interface for the [yt-dlp](https://github.com/yt-dlp/yt-dlp) program
#[derive(Debug)]
pub struct Ytdl {
    program: &'static str,
}

impl Ytdl {
    /// Verify that the `yt-dlp` or `youtube-dl` binaries are reachable
    pub fn new() -> Result<Self> {
        for program in [YT_DLP, YT_DL] {
            let res = run_command(program, |cmd| cmd.arg("--version"), Capture::STDOUT);
            match res {
                Ok(output) if output.status.success() => {
                    let version = String::from_utf8_lossy(&output.stdout);
                    debug!("Using {program} {}", version.trim());
                    return Ok(Self { program });
                }
                _ => debug!("{program} not usable"),
            }
        }

        bail("Neither yt-dlp nor youtube-dl found")
    }
}

impl ClipTransfer for Ytdl {
    fn download(&self, url: &str, output: &Path) -> Result<()> {
        let template = output_template(output);

        assert_success_command(self.program, |cmd| {
            cmd.arg("-q")
                .arg("--no-warnings")
                .args([OsStr::new("-o"), OsStr::new(&template)])
                .arg("--")
                .arg(url)
        })
    }
}

/// yt-dlp reads `-o` as a template where `%` starts a field
fn output_template(output: &Path) -> String {
    output.to_string_lossy().replace('%', "%%")
}
