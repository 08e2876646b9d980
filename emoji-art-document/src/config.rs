//! Document configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default file name of the persisted document.
pub const DEFAULT_FILE_NAME: &str = "emoji_art.json";

/// Default coalescing interval for auto-save.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

/// Directory name under the platform data directory.
const APP_DIR: &str = "emoji-art";

/// Settings for opening a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Directory holding the persisted document.
    pub data_dir: PathBuf,
    /// File name of the persisted document.
    pub file_name: String,
    /// Quiet period after the last edit before the document is written.
    pub autosave_interval: Duration,
    /// Transport timeout for background retrieval. `None` waits indefinitely.
    pub fetch_timeout: Option<Duration>,
    /// User agent sent with background requests.
    pub user_agent: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            fetch_timeout: None,
            user_agent: format!("emoji-art/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DocumentConfig {
    /// Defaults overridden by `EMOJI_ART_DATA_DIR`, `EMOJI_ART_AUTOSAVE_MS`
    /// and `EMOJI_ART_FETCH_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var_os("EMOJI_ART_DATA_DIR")
                .map_or(defaults.data_dir, PathBuf::from),
            autosave_interval: Duration::from_millis(env_parse(
                "EMOJI_ART_AUTOSAVE_MS",
                duration_millis(DEFAULT_AUTOSAVE_INTERVAL),
            )),
            fetch_timeout: std::env::var("EMOJI_ART_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
            ..defaults
        }
    }

    /// Full path of the persisted document.
    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

/// Application-private data directory, falling back to the working directory.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Parse an environment variable, falling back to `default` if it is unset
/// or malformed.
#[must_use]
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
