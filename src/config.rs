//! Run configuration: YAML file plus command-line overrides.
//!
//! A run is described by an immutable [`Settings`] value, built once from a
//! [`ConfigFile`] and an optional set of [`Overrides`]:
//!
//! ```yaml
//! channels:
//!   - "@rust_news"
//!   - -1001234567890
//! start_date: 2024-01-01
//! end_date: 2024-01-31
//! output_dir: data          # optional, defaults to "."
//! page_size: 100            # optional, 1..=100
//! session:
//!   export_dir: exports     # optional
//!   assume_descending: true # optional
//! ```
//!
//! Any field given on the command line replaces the file value wholesale;
//! channel lists are never merged.
//!
//! # Example
//!
//! ```rust
//! use tgharvest::config::{ConfigFile, Overrides};
//!
//! # fn main() -> tgharvest::Result<()> {
//! let file = ConfigFile::from_yaml_str("channels: ['@a', '@b']\nstart_date: 2024-01-01\nend_date: 2024-01-31\n")?;
//! let settings = file.resolve(&Overrides::new().with_channels(["@c"]))?;
//!
//! assert_eq!(settings.channels().len(), 1);
//! assert_eq!(settings.channels()[0].as_str(), "@c");
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;
use crate::core::filter::{DateWindow, parse_date};
use crate::error::{HarvestError, Result};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Messages requested per history page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Largest page the platform serves in one request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Loads a config file and builds [`Settings`] from it alone.
///
/// # Errors
///
/// Returns [`HarvestError::Config`] if the file is missing, malformed, or
/// lacks `channels`, `start_date` or `end_date`.
pub fn load(path: impl AsRef<Path>) -> Result<Settings> {
    ConfigFile::load(path)?.resolve(&Overrides::default())
}

/// A channel entry as written in YAML: a string or a bare integer id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChannelEntry {
    /// `"@handle"` or a quoted id.
    Name(String),
    /// An unquoted numeric id.
    Id(i64),
}

impl ChannelEntry {
    fn to_channel_id(&self) -> Result<ChannelId> {
        match self {
            ChannelEntry::Name(name) => ChannelId::parse(name),
            ChannelEntry::Id(id) => ChannelId::parse(&id.to_string()),
        }
    }
}

/// Session backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// Directory holding channel exports for the export session (default: `exports`)
    pub export_dir: PathBuf,

    /// Trust the session's newest-first ordering and stop at the first
    /// message older than the window (default: true)
    pub assume_descending: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("exports"),
            assume_descending: true,
        }
    }
}

impl SessionSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the export directory.
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    /// Sets whether early termination on old messages is allowed.
    #[must_use]
    pub fn with_assume_descending(mut self, enabled: bool) -> Self {
        self.assume_descending = enabled;
        self
    }
}

/// Raw contents of a YAML config file. Every key is optional at this stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Channels to harvest
    #[serde(default)]
    pub channels: Option<Vec<ChannelEntry>>,

    /// First day of the window, `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: Option<String>,

    /// Last day of the window, `YYYY-MM-DD`
    #[serde(default)]
    pub end_date: Option<String>,

    /// Directory receiving the JSON files
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Messages per history request
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Session backend settings
    #[serde(default)]
    pub session: SessionSettings,

    #[serde(skip)]
    source: Option<PathBuf>,
}

impl ConfigFile {
    /// Reads and parses a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] if the file cannot be read or is not
    /// valid YAML for this schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            HarvestError::config_at(format!("cannot read config file: {e}"), path)
        })?;
        let mut file = parse_yaml(&content).map_err(|message| HarvestError::config_at(message, path))?;
        file.source = Some(path.to_path_buf());
        Ok(file)
    }

    /// Parses config file contents.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        parse_yaml(content).map_err(HarvestError::config)
    }

    /// The file this config was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Merges command-line overrides over the file values and validates the result.
    ///
    /// Overrides may supply keys the file leaves out.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] when a required key is missing from
    /// both sources, or [`HarvestError::InvalidDate`] for unparsable dates.
    pub fn resolve(self, overrides: &Overrides) -> Result<Settings> {
        let fail = |message: String| match &self.source {
            Some(path) => HarvestError::config_at(message, path),
            None => HarvestError::config(message),
        };

        let channels = match &overrides.channels {
            Some(list) => list
                .iter()
                .map(|c| ChannelId::parse(c))
                .collect::<Result<Vec<_>>>()?,
            None => self
                .channels
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(ChannelEntry::to_channel_id)
                .collect::<Result<Vec<_>>>()?,
        };
        if channels.is_empty() {
            return Err(fail(
                "no channels given (set 'channels' or pass --channels)".to_string(),
            ));
        }

        let start = overrides
            .start_date
            .as_deref()
            .or(self.start_date.as_deref())
            .ok_or_else(|| fail("missing 'start_date' (or --start-date)".to_string()))?;
        let end = overrides
            .end_date
            .as_deref()
            .or(self.end_date.as_deref())
            .ok_or_else(|| fail("missing 'end_date' (or --end-date)".to_string()))?;
        let window = DateWindow::parse(start, end)?;

        let mut session = self.session;
        if let Some(dir) = &overrides.export_dir {
            session.export_dir.clone_from(dir);
        }

        let settings = Settings {
            channels,
            window,
            output_dir: overrides
                .output_dir
                .clone()
                .or(self.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            session,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn parse_yaml(content: &str) -> std::result::Result<ConfigFile, String> {
    // An empty file deserializes as YAML null, not as an empty mapping.
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml_ng::from_str(content).map_err(|e| format!("invalid YAML: {e}"))
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replacement channel list
    pub channels: Option<Vec<String>>,
    /// Replacement start date, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Replacement end date, `YYYY-MM-DD`
    pub end_date: Option<String>,
    /// Replacement output directory
    pub output_dir: Option<PathBuf>,
    /// Replacement export directory
    pub export_dir: Option<PathBuf>,
}

impl Overrides {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the channel list.
    #[must_use]
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.channels = Some(channels.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the start date.
    #[must_use]
    pub fn with_start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    /// Replaces the end date.
    #[must_use]
    pub fn with_end_date(mut self, date: impl Into<String>) -> Self {
        self.end_date = Some(date.into());
        self
    }

    /// Replaces the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Replaces the export directory.
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    /// Returns `true` if no override is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    channels: Vec<ChannelId>,
    window: DateWindow,
    output_dir: PathBuf,
    page_size: usize,
    session: SessionSettings,
}

impl Settings {
    /// Creates settings for the given channels and window, with defaults elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] if `channels` is empty.
    pub fn new(channels: Vec<ChannelId>, window: DateWindow) -> Result<Self> {
        let settings = Self {
            channels,
            window,
            output_dir: PathBuf::from("."),
            page_size: DEFAULT_PAGE_SIZE,
            session: SessionSettings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the page size, clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Sets the session settings.
    #[must_use]
    pub fn with_session(mut self, session: SessionSettings) -> Self {
        self.session = session;
        self
    }

    /// Applies command-line overrides to already-built settings.
    ///
    /// Each given field replaces the current one; dates are re-validated as a pair.
    pub fn apply_overrides(self, overrides: &Overrides) -> Result<Self> {
        let channels = match &overrides.channels {
            Some(list) => list
                .iter()
                .map(|c| ChannelId::parse(c))
                .collect::<Result<Vec<_>>>()?,
            None => self.channels,
        };
        let start = match &overrides.start_date {
            Some(s) => parse_date(s)?,
            None => self.window.start(),
        };
        let end = match &overrides.end_date {
            Some(s) => parse_date(s)?,
            None => self.window.end(),
        };
        let mut session = self.session;
        if let Some(dir) = &overrides.export_dir {
            session.export_dir.clone_from(dir);
        }

        let settings = Self {
            channels,
            window: DateWindow::new(start, end)?,
            output_dir: overrides.output_dir.clone().unwrap_or(self.output_dir),
            page_size: self.page_size,
            session,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(HarvestError::config("channel list is empty"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(HarvestError::config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    /// Channels in processing order.
    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// The inclusive date window.
    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Directory receiving the JSON files.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Messages per history request.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Session backend settings.
    pub fn session(&self) -> &SessionSettings {
        &self.session
    }
}
