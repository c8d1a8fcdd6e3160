use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    helix::{CategoryLookup, UNKNOWN_CATEGORY},
    outside::ClipTransfer,
    result::{err_msg, Result},
    settings::UserPreferences,
    types::Clip,
};

pub const MEDIA_EXTENSION: &str = "mp4";

const UNTITLED: &str = "untitled";
const UNKNOWN_CREATOR: &str = "unknown";

static NOT_WORD_OR_SPACE: OnceLock<Regex> = OnceLock::new();

/// Remove every character that is neither alphanumeric, `_`, nor whitespace,
/// then trim the ends. Inner whitespace is kept as is.
pub fn sanitize(text: &str) -> String {
    let re = NOT_WORD_OR_SPACE.get_or_init(|| Regex::new(r"[^\w\s]").unwrap());
    re.replace_all(text, "").trim().to_owned()
}

fn sanitize_or(text: &str, fallback: &str) -> String {
    let clean = sanitize(text);
    if clean.is_empty() {
        fallback.to_owned()
    } else {
        clean
    }
}

/// `<date><spacer><category><spacer><title><spacer><creator>.mp4`
pub fn file_name(date: &str, category: &str, clip: &Clip, spacer: &str) -> String {
    let parts = [
        date.to_owned(),
        sanitize_or(category, UNKNOWN_CATEGORY),
        sanitize_or(&clip.title, UNTITLED),
        sanitize_or(&clip.creator_name, UNKNOWN_CREATOR),
    ];
    format!("{}.{MEDIA_EXTENSION}", parts.join(spacer))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Downloaded,
    /// The file was already there, nothing transferred
    AlreadyPresent,
    /// Simulation mode, nothing transferred
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub clip_id: String,
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Result of a batch, entries in the order of the input clips
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub entries: Vec<Entry>,
    /// Clips skipped because their URL or date was missing
    pub incomplete: usize,
    pub failed: usize,
}

impl DownloadReport {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|entry| entry.path.clone()).collect()
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Display for DownloadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} downloaded, {} already present, {} simulated, {} incomplete, {} failed",
            self.count(Outcome::Downloaded),
            self.count(Outcome::AlreadyPresent),
            self.count(Outcome::Simulated),
            self.incomplete,
            self.failed
        )
    }
}

/// Turns clips into local files, one at a time
pub struct Downloader<'a> {
    transfer: &'a dyn ClipTransfer,
    output_directory: &'a Path,
    spacer: &'a str,
    simulate: bool,
}

impl<'a> Downloader<'a> {
    pub fn new(transfer: &'a dyn ClipTransfer, prefs: &'a UserPreferences, simulate: bool) -> Self {
        Self {
            transfer,
            output_directory: &prefs.output_directory,
            spacer: &prefs.spacer,
            simulate,
        }
    }

    /// Download every clip that is not already on disk.
    ///
    /// Only failing to create the output directory is an error. A clip that
    /// cannot be downloaded is logged and left out of the report entries.
    pub fn download_all(
        &self,
        clips: &[Clip],
        categories: &mut dyn CategoryLookup,
    ) -> Result<DownloadReport> {
        if !self.simulate {
            std::fs::create_dir_all(self.output_directory).map_err(|err| {
                err_msg(format!("Could not create {}: {err}", self.output_directory.display()))
            })?;
        }

        let mut report = DownloadReport::default();
        for clip in clips {
            let Some(date) = clip.created_date().filter(|_| !clip.url.is_empty()) else {
                warn!("Skipping clip {} with missing URL or date", clip.id);
                report.incomplete += 1;
                continue;
            };

            let category = categories.category_name(&clip.category_id);
            let name = file_name(date, &category, clip, self.spacer);
            let path = self.output_directory.join(&name);

            match self.materialize(clip, &name, &path) {
                Some(outcome) => report.entries.push(Entry {
                    clip_id: clip.id.clone(),
                    path,
                    outcome,
                }),
                None => report.failed += 1,
            }
        }

        Ok(report)
    }

    fn materialize(&self, clip: &Clip, name: &str, path: &Path) -> Option<Outcome> {
        if path.exists() {
            info!("Already downloaded: {name}");
            return Some(Outcome::AlreadyPresent);
        }

        if self.simulate {
            info!("Would download {} as {name}", clip.url);
            return Some(Outcome::Simulated);
        }

        info!("Downloading {} as {name}", clip.url);
        match self.transfer.download(&clip.url, path) {
            Ok(()) if path.exists() => Some(Outcome::Downloaded),
            Ok(()) => {
                error!("Download of {} reported success but {name} is missing", clip.url);
                None
            }
            Err(err) => {
                error!("Error downloading {}: {err}", clip.url);
                None
            }
        }
    }
}
