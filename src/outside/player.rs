use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::command::spawn_detached;
use crate::result::Result;

const VLC: &str = "vlc";

/// The VLC media player, opened with a playlist of files
#[derive(Debug)]
pub struct Player {
    program: PathBuf,
}

impl Player {
    /// Locate VLC: the usual install locations first, then `PATH`
    pub fn find() -> Self {
        let program = install_locations()
            .into_iter()
            .find(|candidate| candidate.is_file())
            .unwrap_or_else(|| PathBuf::from(VLC));

        debug!("Using media player {}", program.display());
        Self { program }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Open the files as one playlist, without waiting for the player to exit
    pub fn play(&self, files: &[PathBuf]) -> Result<()> {
        spawn_detached(&self.program, |cmd| cmd.args(files))?;
        info!("Opened {} clips in {}", files.len(), self.program.display());
        Ok(())
    }
}

fn install_locations() -> Vec<PathBuf> {
    if cfg!(windows) {
        ["ProgramFiles", "ProgramFiles(x86)"]
            .into_iter()
            .filter_map(std::env::var_os)
            .map(|dir| PathBuf::from(dir).join("VideoLAN").join("VLC").join("vlc.exe"))
            .collect()
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from("/Applications/VLC.app/Contents/MacOS/VLC")]
    } else {
        vec![]
    }
}
