//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings, cached server URL):
//!   Windows: %APPDATA%\story-frames\
//!   macOS:   ~/Library/Application Support/story-frames/
//!   Linux:   ~/.config/story-frames/
//!
//! Data dir (decoded frames written by the `play` command):
//!   Windows: %LOCALAPPDATA%\story-frames\
//!   macOS:   ~/Library/Application Support/story-frames/
//!   Linux:   ~/.local/share/story-frames/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default output directory for decoded frame images.
    pub frames_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "story-frames";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let frames_dir = data_dir.join("frames");

        Self {
            config_dir,
            settings_file,
            frames_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
