use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
};

use bitflags::bitflags;
use config::{Config, File, FileFormat};
use miette::{Context, IntoDiagnostic};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::result::{bail, Result};

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_SPACER: &str = " ¦ ";

bitflags! {
    /// Top-level sections of the configuration file
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Sections: u8 {
        const USER = 0b01;
        const AUTH = 0b10;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub user: UserPreferences,
    #[serde(default)]
    pub auth: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    #[serde(alias = "default_user_name", deserialize_with = "nullable")]
    pub default_channel_name: String,
    #[serde(alias = "dl_folder", deserialize_with = "nullable")]
    pub output_directory: PathBuf,
    #[serde(deserialize_with = "nullable")]
    pub spacer: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            default_channel_name: String::new(),
            output_directory: PathBuf::new(),
            spacer: DEFAULT_SPACER.to_owned(),
        }
    }
}

impl UserPreferences {
    /// Check the fields a download run cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.output_directory.as_os_str().is_empty() {
            return bail("The output directory is not configured");
        }
        if self.spacer.is_empty() {
            return bail("The file name spacer is not configured");
        }
        if self.spacer.contains(['/', '\\']) {
            return bail(format!("The file name spacer '{}' contains a path separator", self.spacer));
        }
        Ok(())
    }
}

/// Application credentials and the access token derived from them.
///
/// `access_token` and `expires_at` are refreshable state, the client pair
/// is supplied by the operator.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[serde(deserialize_with = "nullable")]
    pub client_id: String,
    #[serde(deserialize_with = "nullable")]
    pub client_secret: String,
    #[serde(deserialize_with = "nullable")]
    pub access_token: String,
    #[serde(deserialize_with = "nullable")]
    pub expires_at: String,
}

impl Credentials {
    pub fn has_client(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Forget the access token, e.g. when the client it belongs to changed
    pub fn clear_token(&mut self) {
        self.access_token.clear();
        self.expires_at.clear();
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &str| if s.is_empty() { "" } else { "<redacted>" };

        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("access_token", &redact(&self.access_token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Older config files contain `null` for values that were never entered
fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The configuration file and its loaded content.
///
/// Loaded once at startup. Saving rewrites the file with the given sections
/// replaced and every other section left as found on disk.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    settings: Settings,
    on_disk: bool,
}

impl ConfigStore {
    /// Load the configuration file, or start empty if it does not exist.
    ///
    /// A file that exists but cannot be parsed is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let on_disk = path.exists();

        let settings = if on_disk {
            debug!("Reading configuration from {}", path.display());
            Config::builder()
                .add_source(File::from(path.as_path()).format(FileFormat::Json))
                .build()
                .and_then(|config| config.try_deserialize::<Settings>())
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not read {}", path.display()))?
        } else {
            info!("No configuration file found. Starting with an empty configuration");
            Settings::default()
        };

        Ok(Self {
            path,
            settings,
            on_disk,
        })
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file existed when loaded or has been saved since
    pub fn exists(&self) -> bool {
        self.on_disk
    }

    #[cfg(test)]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn user(&self) -> &UserPreferences {
        &self.settings.user
    }

    pub fn auth(&self) -> &Credentials {
        &self.settings.auth
    }

    pub fn set_user(&mut self, user: UserPreferences) {
        self.settings.user = user;
    }

    pub fn set_auth(&mut self, auth: Credentials) {
        self.settings.auth = auth;
    }

    /// Write the given sections to the file
    pub fn save(&mut self, sections: Sections) -> Result<()> {
        let mut root = self.read_raw()?;

        if sections.contains(Sections::USER) {
            root.insert("user".to_owned(), serde_json::to_value(&self.settings.user)?);
        }
        if sections.contains(Sections::AUTH) {
            root.insert("auth".to_owned(), serde_json::to_value(&self.settings.auth)?);
        }

        self.write_raw(&root)
            .map_err(|err| err.wrap_err_with(|| format!("Could not write {}", self.path.display())))?;
        self.on_disk = true;

        info!("Configuration saved to {}", self.path.display());
        Ok(())
    }

    /// The file as a JSON object, so sections we do not know survive a save
    fn read_raw(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                warn!(
                    "{} does not hold a JSON object, it will be overwritten",
                    self.path.display()
                );
                Ok(Map::new())
            }
        }
    }

    fn write_raw(&self, root: &Map<String, Value>) -> Result<()> {
        let mut content = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut content, PrettyFormatter::with_indent(b"    "));
        root.serialize(&mut serializer)?;
        content.push(b'\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Same directory as the target so the rename stays on one filesystem
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&content)?;
        tmp.persist(&self.path).map_err(|err| err.error)?;

        Ok(())
    }
}
