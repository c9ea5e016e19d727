//! Library error type.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Nothing to show. Fatal at startup.
    #[error("no images found under {}", root.display())]
    NoImages { root: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Decoder hit the configured allocation limit (the "out of memory" case).
    #[error("decode {}: image exceeds memory limit", path.display())]
    MemoryLimit { path: PathBuf },

    #[error("config: {0}")]
    Config(String),

    #[cfg(feature = "heic")]
    #[error("heic {}: {source}", path.display())]
    Heic {
        path: PathBuf,
        #[source]
        source: libheif_rs::HeifError,
    },
}

impl FrameError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FrameError::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify an `image` error: allocation limits become [`FrameError::MemoryLimit`].
    pub(crate) fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        let path = path.into();
        match source {
            image::ImageError::Limits(_) => FrameError::MemoryLimit { path },
            image::ImageError::IoError(e) => FrameError::Io { path, source: e },
            other => FrameError::Decode {
                path,
                source: other,
            },
        }
    }

    pub fn is_memory_limit(&self) -> bool {
        matches!(self, FrameError::MemoryLimit { .. })
    }
}
