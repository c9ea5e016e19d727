//! Turning an [`ImageRef`] into a display-ready surface.

use std::path::Path;

use crate::error::FrameError;
use crate::preload::DecodedImage;
use crate::thumbs::{self, ThumbnailStore};
use crate::{ImageRef, ScreenSize};

/// Anything that can produce a decoded surface for an image. Shared by the
/// display loop and the prefetch threads.
pub trait SurfaceLoader: Send + Sync {
    fn load(&self, image: &ImageRef, target: ScreenSize) -> Result<DecodedImage, FrameError>;
}

/// Loads through the on-disk thumbnail store. If the thumbnail can't be made or
/// read, decodes and downscales the source in memory instead (not cached on
/// disk). A memory-limit failure is final: retrying the same decode won't help.
#[derive(Debug, Clone)]
pub struct ThumbLoader {
    store: ThumbnailStore,
}

impl ThumbLoader {
    pub fn new(store: ThumbnailStore) -> Self {
        ThumbLoader { store }
    }

    pub fn store(&self) -> &ThumbnailStore {
        &self.store
    }

    fn from_thumbnail(&self, image: &ImageRef, target: ScreenSize) -> Result<DecodedImage, FrameError> {
        let thumb = self.store.ensure(image, target)?;
        let img = thumbs::open_image(&thumb, self.store.max_alloc())?;
        Ok(DecodedImage::from_rgb(img.into_rgb8()))
    }

    fn from_source(&self, image: &ImageRef, target: ScreenSize) -> Result<DecodedImage, FrameError> {
        let img = thumbs::open_image(image.path(), self.store.max_alloc())?;
        Ok(DecodedImage::from_rgb(thumbs::fit_within(img, target).into_rgb8()))
    }
}

impl SurfaceLoader for ThumbLoader {
    fn load(&self, image: &ImageRef, target: ScreenSize) -> Result<DecodedImage, FrameError> {
        ensure_exists(image.path())?;
        match self.from_thumbnail(image, target) {
            Ok(decoded) => Ok(decoded),
            Err(e) if e.is_memory_limit() => Err(e),
            Err(_) => self.from_source(image, target),
        }
    }
}

/// A file removed after the scan must not be served from a stale thumbnail.
fn ensure_exists(path: &Path) -> Result<(), FrameError> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(e) => Err(FrameError::io(path, e)),
    }
}
