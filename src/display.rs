//! The SDL2 side of the frame: window, event loop, render.
//!
//! Everything that decides *what* to show lives in the library (`slideshow`,
//! `nav`, `layout`, `input`). This module only turns events into
//! triggers and uploads the current surface.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use sdl2::event::{Event, WindowEvent};
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::Rect;
use sdl2::render::{TextureCreator, WindowCanvas};
use sdl2::video::WindowContext;

use picframe::config::Config;
use picframe::input::{self, Action};
use picframe::layout::{self, Placement};
use picframe::loader::{SurfaceLoader, ThumbLoader};
use picframe::nav::{NavState, Outcome, SlideTimer, Trigger};
use picframe::preload::{Surface, SurfaceCache};
use picframe::slideshow::Slideshow;
use picframe::ScreenSize;

use crate::cli;

/// Window size when running windowed without a configured screen.
const WINDOWED_DEFAULT: ScreenSize = ScreenSize::new(800, 480);

/// Size of the primary display's desktop mode.
pub fn desktop_size() -> Result<ScreenSize> {
    let sdl = sdl2::init().map_err(|e| anyhow!("SDL2 init failed: {}", e))?;
    let video = sdl.video().map_err(|e| anyhow!("SDL2 video init failed: {}", e))?;
    let mode = video
        .desktop_display_mode(0)
        .map_err(|e| anyhow!("no display mode: {}", e))?;
    Ok(ScreenSize::new(mode.w.max(1) as u32, mode.h.max(1) as u32))
}

pub fn run(cfg: &Config) -> Result<()> {
    // Scan before touching the display so an empty library fails fast.
    let images = cli::discover(cfg)?;
    let nav = NavState::shuffled(images, &cfg.image_dir, &mut rand::rng())?
        .with_pause_on_navigate(cfg.pause_on_navigate);
    log::info!("{} images in {}", nav.len(), cfg.image_dir.display());

    // ── SDL2 ────────────────────────────────────────────────────────────
    sdl2::hint::set("SDL_RENDER_SCALE_QUALITY", "1");
    let sdl = sdl2::init().map_err(|e| anyhow!("SDL2 init failed: {}", e))?;
    let video = sdl
        .video()
        .map_err(|e| anyhow!("SDL2 video init failed: {}", e))?;

    let screen = match cfg.screen {
        Some(s) => s,
        None if !cfg.fullscreen => WINDOWED_DEFAULT,
        None => {
            let mode = video
                .desktop_display_mode(0)
                .map_err(|e| anyhow!("no display mode: {}", e))?;
            ScreenSize::new(mode.w.max(1) as u32, mode.h.max(1) as u32)
        }
    };

    let mut builder = video.window("picframe", screen.width, screen.height);
    builder.position_centered();
    if cfg.fullscreen {
        builder.fullscreen_desktop();
    }
    let window = builder.build().context("Failed to create window")?;
    if cfg.hide_cursor {
        sdl.mouse().show_cursor(false);
    }

    let mut canvas = window
        .into_canvas()
        .build()
        .context("Failed to create renderer")?;
    let texture_creator = canvas.texture_creator();
    let mut event_pump = sdl
        .event_pump()
        .map_err(|e| anyhow!("Failed to create event pump: {}", e))?;
    log::info!(
        "display: {} {}",
        screen,
        if cfg.fullscreen { "fullscreen" } else { "windowed" }
    );

    // ── Slideshow ───────────────────────────────────────────────────────
    let cache = Arc::new(SurfaceCache::new(cfg.surface_cache_size));
    let loader: Arc<dyn SurfaceLoader> = Arc::new(ThumbLoader::new(cli::open_store(cfg)?));
    let mut frame = Slideshow::new(nav, cache, loader, cfg.prefetch_count, screen);
    let mut timer = SlideTimer::new(cfg.display_interval(), Instant::now());
    frame.prefetch_upcoming();

    let mut needs_display = true;
    let mut needs_render = true;
    let mut running = true;

    while running {
        for event in event_pump.poll_iter() {
            let action = match event {
                Event::Quit { .. } => Some(Action::Quit),
                Event::KeyDown {
                    keycode: Some(key),
                    repeat: false,
                    ..
                } => input::key_action(&key.name()),
                Event::MouseButtonDown { x, .. } => {
                    let (width, _) = canvas.window().size();
                    Some(input::zone_action(x, width))
                }
                Event::Window {
                    win_event: WindowEvent::Exposed | WindowEvent::SizeChanged(..),
                    ..
                } => {
                    needs_render = true;
                    None
                }
                _ => None,
            };
            match action {
                Some(Action::Quit) => {
                    running = false;
                    break;
                }
                Some(Action::Nav(trigger)) => {
                    match frame.apply(trigger) {
                        Outcome::Shown => needs_display = true,
                        Outcome::PauseToggled => {
                            let state = if frame.is_paused() { "paused" } else { "resumed" };
                            log::info!("{}", state);
                            needs_render = true;
                        }
                        Outcome::Unchanged => {}
                    }
                    timer.reset(Instant::now());
                    // Show the result before looking at the next event; the
                    // rest stay queued for the next pass.
                    break;
                }
                None => {}
            }
        }
        if !running {
            break;
        }

        if timer.is_due(Instant::now(), frame.is_paused())
            && frame.apply(Trigger::AutoAdvance) == Outcome::Shown
        {
            needs_display = true;
        }

        if needs_display {
            needs_display = false;
            match frame.show_current() {
                Ok(()) => needs_render = true,
                Err(e) => log::error!(
                    "Failed to load {}: {}",
                    frame.nav().current().path().display(),
                    e
                ),
            }
            frame.prefetch_upcoming();
            timer.reset(Instant::now());
        }

        if needs_render {
            needs_render = false;
            if let Err(e) = render(
                &mut canvas,
                &texture_creator,
                frame.shown(),
                frame.is_paused(),
            ) {
                log::error!("render: {:#}", e);
            }
        }

        std::thread::sleep(cfg.poll_interval());
    }

    log::info!("bye");
    Ok(())
}

fn rect(p: Placement) -> Rect {
    Rect::new(p.x, p.y, p.width, p.height)
}

/// Draw `surface` centered on black, plus the pause badge. Reads state only,
/// so calling it twice in a row draws the same frame.
fn render(
    canvas: &mut WindowCanvas,
    texture_creator: &TextureCreator<WindowContext>,
    surface: Option<&Surface>,
    paused: bool,
) -> Result<()> {
    let (w, h) = canvas.output_size().map_err(|e| anyhow!(e))?;
    let screen = ScreenSize::new(w, h);

    canvas.set_draw_color(Color::RGB(0, 0, 0));
    canvas.clear();

    if let Some(surface) = surface {
        if let Some(dst) = layout::fit_centered(surface.width, surface.height, screen) {
            let mut texture = texture_creator.create_texture_streaming(
                PixelFormatEnum::RGB24,
                surface.width,
                surface.height,
            )?;
            texture.update(None, &surface.rgb, surface.pitch())?;
            canvas
                .copy(&texture, None, Some(rect(dst)))
                .map_err(|e| anyhow!(e))?;
        }
    }

    if paused {
        let bars = layout::pause_badge(screen);
        canvas.set_draw_color(Color::RGB(16, 16, 16));
        for bar in &bars {
            let mut shadow = rect(*bar);
            shadow.offset(2, 2);
            canvas.fill_rect(shadow).map_err(|e| anyhow!(e))?;
        }
        canvas.set_draw_color(Color::RGB(240, 240, 240));
        for bar in &bars {
            canvas.fill_rect(rect(*bar)).map_err(|e| anyhow!(e))?;
        }
    }

    canvas.present();
    Ok(())
}
