//! Slideshow navigation: shuffled play order, shown-history and redo-future.
//!
//! Back/Forward retrace a manual path exactly: Back moves the current image
//! onto the redo stack, Forward takes it off again. A natural advance (timer, or
//! Forward with nothing to redo) steps the play-order cursor instead. Only the
//! timer throws the redo stack away.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::FrameError;
use crate::ImageRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Back,
    Forward,
    AutoAdvance,
    TogglePause,
}

/// What a trigger did to the visible state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Precondition not met (Back with nothing behind).
    Unchanged,
    /// A different history entry is now current.
    Shown,
    PauseToggled,
}

#[derive(Clone, Debug)]
pub struct NavState {
    order: Arc<[ImageRef]>,
    cursor: usize,
    // Both stacks hold indices into `order`; a frame left running for months
    // pushes one entry per slide.
    history: Vec<usize>,
    future: Vec<usize>,
    paused: bool,
    pause_on_navigate: bool,
}

impl NavState {
    /// Start at `order[0]`. An empty order is a fatal configuration error.
    pub fn new(order: Vec<ImageRef>, root: &std::path::Path) -> Result<Self, FrameError> {
        if order.is_empty() {
            return Err(FrameError::NoImages {
                root: root.to_path_buf(),
            });
        }
        Ok(NavState {
            order: order.into(),
            cursor: 0,
            history: vec![0],
            future: Vec::new(),
            paused: false,
            pause_on_navigate: false,
        })
    }

    /// Shuffle the scanned list once, then start at its first entry.
    pub fn shuffled<R: Rng + ?Sized>(
        mut images: Vec<ImageRef>,
        root: &std::path::Path,
        rng: &mut R,
    ) -> Result<Self, FrameError> {
        images.shuffle(rng);
        Self::new(images, root)
    }

    /// Manual Back/Forward that shows a new image also pauses the show.
    pub fn with_pause_on_navigate(mut self, on: bool) -> Self {
        self.pause_on_navigate = on;
        self
    }

    pub fn current(&self) -> &ImageRef {
        // history is never empty: seeded in new(), Back keeps at least one entry
        let top = self.history.last().copied().unwrap_or(self.cursor);
        &self.order[top]
    }

    pub fn order(&self) -> &Arc<[ImageRef]> {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Shown images, oldest first; the last one is current.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &ImageRef> + '_ {
        self.history.iter().map(|&i| &self.order[i])
    }

    /// Redo stack, bottom first; the last one is what Forward brings back.
    pub fn future(&self) -> impl ExactSizeIterator<Item = &ImageRef> + '_ {
        self.future.iter().map(|&i| &self.order[i])
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Where the next natural advance will land; prefetch batches start here.
    pub fn upcoming_start(&self) -> usize {
        (self.cursor + 1) % self.order.len()
    }

    pub fn apply(&mut self, trigger: Trigger) -> Outcome {
        match trigger {
            Trigger::Back => {
                if self.history.len() <= 1 {
                    return Outcome::Unchanged;
                }
                if let Some(top) = self.history.pop() {
                    self.future.push(top);
                }
                self.pause_after_manual();
                Outcome::Shown
            }
            Trigger::Forward => {
                match self.future.pop() {
                    Some(next) => self.history.push(next),
                    None => self.advance_cursor(),
                }
                self.pause_after_manual();
                Outcome::Shown
            }
            Trigger::AutoAdvance => {
                if self.paused {
                    return Outcome::Unchanged;
                }
                self.advance_cursor();
                self.future.clear();
                Outcome::Shown
            }
            Trigger::TogglePause => {
                self.paused = !self.paused;
                Outcome::PauseToggled
            }
        }
    }

    fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1) % self.order.len();
        self.history.push(self.cursor);
    }

    fn pause_after_manual(&mut self) {
        if self.pause_on_navigate {
            self.paused = true;
        }
    }
}

/// Auto-advance clock. Time is passed in so the logic stays testable.
#[derive(Clone, Copy, Debug)]
pub struct SlideTimer {
    interval: Duration,
    last_switch: Instant,
}

impl SlideTimer {
    pub fn new(interval: Duration, now: Instant) -> Self {
        SlideTimer {
            interval,
            last_switch: now,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_switch = now;
    }

    pub fn is_due(&self, now: Instant, paused: bool) -> bool {
        !paused && now.saturating_duration_since(self.last_switch) >= self.interval
    }
}
