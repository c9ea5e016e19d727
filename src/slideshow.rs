//! What the frame shows: navigation plus the surface on screen.
//!
//! The display loop owns one `Slideshow`, feeds it triggers and asks it for the
//! current surface. A cache hit is used as is; a miss loads synchronously and
//! stores the result. A failed load leaves the previous surface up.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::error::FrameError;
use crate::loader::SurfaceLoader;
use crate::nav::{NavState, Outcome, Trigger};
use crate::preload::{Prefetcher, Surface, SurfaceCache};
use crate::ScreenSize;

pub struct Slideshow {
    nav: NavState,
    cache: Arc<SurfaceCache>,
    loader: Arc<dyn SurfaceLoader>,
    prefetcher: Prefetcher,
    prefetch_count: usize,
    target: ScreenSize,
    /// What is on screen right now. Survives cache eviction and failed loads.
    shown: Option<Surface>,
}

impl Slideshow {
    pub fn new(
        nav: NavState,
        cache: Arc<SurfaceCache>,
        loader: Arc<dyn SurfaceLoader>,
        prefetch_count: usize,
        target: ScreenSize,
    ) -> Self {
        Slideshow {
            nav,
            prefetcher: Prefetcher::new(cache.clone(), loader.clone()),
            cache,
            loader,
            prefetch_count,
            target,
            shown: None,
        }
    }

    pub fn nav(&self) -> &NavState {
        &self.nav
    }

    pub fn is_paused(&self) -> bool {
        self.nav.is_paused()
    }

    pub fn apply(&mut self, trigger: Trigger) -> Outcome {
        self.nav.apply(trigger)
    }

    pub fn shown(&self) -> Option<&Surface> {
        self.shown.as_ref()
    }

    /// Make the current image's surface the shown one. On error nothing
    /// changes and the previous surface stays up.
    pub fn show_current(&mut self) -> Result<(), FrameError> {
        let image = self.nav.current();
        if let Some(surface) = self.cache.get(image.path()) {
            log::debug!("show (cached): {}", image.file_name());
            self.shown = Some(surface);
            return Ok(());
        }

        let t0 = Instant::now();
        let decoded = self.loader.load(image, self.target)?;
        log::debug!("show (loaded in {:.0?}): {}", t0.elapsed(), image.file_name());
        let surface = Arc::new(decoded);
        self.cache.put(image.path.clone(), surface.clone());
        self.shown = Some(surface);
        Ok(())
    }

    /// Kick a background batch for the images after the cursor.
    pub fn prefetch_upcoming(&self) -> Option<JoinHandle<()>> {
        self.prefetcher.prefetch(
            self.nav.order().clone(),
            self.nav.upcoming_start(),
            self.prefetch_count,
            self.target,
        )
    }
}
