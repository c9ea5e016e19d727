//! picframe: a rotating photo slideshow for small fixed-size screens.
//!
//! The interesting parts live in two modules:
//!   - [`preload`]: bounded LRU surface cache + background prefetcher
//!   - [`nav`]: shuffled play order with back/forward history and redo
//!
//! [`slideshow`] ties them together for the SDL2 display loop in the binary.
//! Everything else is plumbing: directory scanning, the on-disk thumbnail
//! store, decoding, config, and pure geometry/input helpers.

pub mod config;
pub mod error;
pub mod input;
pub mod layout;
pub mod loader;
pub mod nav;
pub mod preload;
pub mod scanner;
pub mod slideshow;
pub mod thumbs;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub use error::FrameError;

/// Identity of a library image. Two refs are the same image iff their paths match.
#[derive(Clone, Debug)]
pub struct ImageRef {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
}

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>, modified: Option<SystemTime>) -> Self {
        ImageRef {
            path: path.into(),
            modified,
        }
    }

    /// Build a ref from disk, reading the mtime (None if unreadable).
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
        ImageRef { path, modified }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// mtime in whole seconds since the epoch, 0 when unknown.
    pub fn mtime_secs(&self) -> u64 {
        self.modified
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Last path component, for log lines.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ImageRef {}

/// Target screen size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub const fn new(width: u32, height: u32) -> Self {
        ScreenSize { width, height }
    }
}

impl std::fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for ScreenSize {
    type Err = FrameError;

    /// Parse `WIDTHxHEIGHT`, e.g. `800x480`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || FrameError::Config(format!("invalid screen size {:?}, expected WxH", s));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(bad)?;
        let width: u32 = w.trim().parse().map_err(|_| bad())?;
        let height: u32 = h.trim().parse().map_err(|_| bad())?;
        if width == 0 || height == 0 {
            return Err(bad());
        }
        Ok(ScreenSize { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn identity_is_path_only() {
        let a = ImageRef::new("/p/a.jpg", None);
        let b = ImageRef::new("/p/a.jpg", Some(SystemTime::UNIX_EPOCH + Duration::from_secs(5)));
        let c = ImageRef::new("/p/c.jpg", None);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn mtime_secs_defaults_to_zero() {
        assert_eq!(ImageRef::new("x.jpg", None).mtime_secs(), 0);
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(ImageRef::new("x.jpg", Some(t)).mtime_secs(), 1_700_000_000);
    }

    #[test]
    fn file_name_strips_dirs() {
        assert_eq!(ImageRef::new("/a/b/c.png", None).file_name(), "c.png");
    }

    #[test]
    fn screen_size_parse() {
        assert_eq!("800x480".parse::<ScreenSize>().unwrap(), ScreenSize::new(800, 480));
        assert_eq!(" 1024X600 ".parse::<ScreenSize>().unwrap(), ScreenSize::new(1024, 600));
        assert!("800".parse::<ScreenSize>().is_err());
        assert!("0x480".parse::<ScreenSize>().is_err());
        assert!("axb".parse::<ScreenSize>().is_err());
    }

    #[test]
    fn screen_size_display() {
        assert_eq!(ScreenSize::new(800, 480).to_string(), "800x480");
    }
}
