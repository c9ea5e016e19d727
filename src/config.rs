//! Frame configuration: `config.toml` in the platform config dir, with CLI
//! overrides applied on top. Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::thumbs::DEFAULT_MAX_DECODE_BYTES;
use crate::ScreenSize;

const CONFIG_FILE_NAME: &str = "config.toml";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "picframe", "picframe")
}

/// `<config dir>/config.toml`, or `./config.toml` when there's no home.
pub fn default_config_path() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.config_dir().join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}

fn default_cache_dir() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.cache_dir().join("thumbs"),
        None => PathBuf::from(".cache").join("thumbs"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub image_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// Seconds each image stays up before the auto-advance.
    pub display_seconds: f64,
    pub prefetch_count: usize,
    pub surface_cache_size: usize,
    pub fullscreen: bool,
    pub hide_cursor: bool,
    /// Manual back/forward also pauses the show.
    pub pause_on_navigate: bool,
    pub max_decode_bytes: u64,
    pub poll_interval_ms: u64,
    /// Fixed screen size; `None` = use the display's desktop mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<ScreenSize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            image_dir: PathBuf::from("Pics"),
            cache_dir: default_cache_dir(),
            display_seconds: 8.0,
            prefetch_count: 3,
            surface_cache_size: 6,
            fullscreen: true,
            hide_cursor: true,
            pause_on_navigate: false,
            max_decode_bytes: DEFAULT_MAX_DECODE_BYTES,
            poll_interval_ms: 10,
            screen: None,
        }
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub image_dir: Option<PathBuf>,
    pub display_seconds: Option<f64>,
    pub screen: Option<ScreenSize>,
    pub windowed: bool,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, FrameError> {
        let cfg: Config = toml::from_str(text).map_err(|e| FrameError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `path`. A missing file yields the defaults; an unreadable or
    /// invalid one is an error.
    pub fn load(path: &Path) -> Result<Self, FrameError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                log::debug!("config: loading {}", path.display());
                Self::from_toml(&text).map_err(|e| match e {
                    FrameError::Config(msg) => {
                        FrameError::Config(format!("{}: {}", path.display(), msg))
                    }
                    other => other,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("config: {} not found, using defaults", path.display());
                Ok(Config::default())
            }
            Err(e) => Err(FrameError::io(path, e)),
        }
    }

    pub fn apply(mut self, o: &Overrides) -> Result<Self, FrameError> {
        if let Some(dir) = &o.image_dir {
            self.image_dir = dir.clone();
        }
        if let Some(secs) = o.display_seconds {
            self.display_seconds = secs;
        }
        if let Some(screen) = o.screen {
            self.screen = Some(screen);
        }
        if o.windowed {
            self.fullscreen = false;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        if !(self.display_seconds.is_finite() && self.display_seconds > 0.0) {
            return Err(FrameError::Config(format!(
                "display_seconds must be > 0, got {}",
                self.display_seconds
            )));
        }
        if let Err(e) = Duration::try_from_secs_f64(self.display_seconds) {
            return Err(FrameError::Config(format!(
                "display_seconds {}: {}",
                self.display_seconds, e
            )));
        }
        if let Some(s) = self.screen {
            if s.width == 0 || s.height == 0 {
                return Err(FrameError::Config(format!("screen size must be non-zero, got {}", s)));
            }
        }
        Ok(())
    }

    /// Only meaningful on a validated config; out-of-range values saturate.
    pub fn display_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.display_seconds).unwrap_or(Duration::MAX)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn to_toml(&self) -> Result<String, FrameError> {
        toml::to_string_pretty(self).map_err(|e| FrameError::Config(e.to_string()))
    }
}
