//! Fitting an image inside the screen.

use crate::ScreenSize;

/// Destination rectangle in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Scale `img_w x img_h` by `min(sw/iw, sh/ih)` and center it. No cropping;
/// small images are scaled up. `None` for degenerate sizes.
pub fn fit_centered(img_w: u32, img_h: u32, screen: ScreenSize) -> Option<Placement> {
    if img_w == 0 || img_h == 0 || screen.width == 0 || screen.height == 0 {
        return None;
    }
    let scale = f64::min(
        screen.width as f64 / img_w as f64,
        screen.height as f64 / img_h as f64,
    );
    let width = ((img_w as f64 * scale) as u32).clamp(1, screen.width);
    let height = ((img_h as f64 * scale) as u32).clamp(1, screen.height);
    Some(Placement {
        x: ((screen.width - width) / 2) as i32,
        y: ((screen.height - height) / 2) as i32,
        width,
        height,
    })
}

/// The two bars of the pause indicator, top-right, sized off the screen height.
pub fn pause_badge(screen: ScreenSize) -> [Placement; 2] {
    let bar_h = (screen.height / 12).max(12);
    let bar_w = (bar_h / 3).max(4);
    let gap = bar_w;
    let margin = (screen.height / 24).max(8);
    let right = screen.width.saturating_sub(margin) as i32;
    let y = margin as i32;
    let bar = |x: i32| Placement { x, y, width: bar_w, height: bar_h };
    [
        bar(right - (2 * bar_w + gap) as i32),
        bar(right - bar_w as i32),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: ScreenSize = ScreenSize::new(800, 480);

    #[test]
    fn wide_image_letterboxed() {
        let p = fit_centered(1600, 400, SCREEN).unwrap();
        assert_eq!(p, Placement { x: 0, y: 140, width: 800, height: 200 });
    }

    #[test]
    fn tall_image_pillarboxed() {
        let p = fit_centered(300, 600, SCREEN).unwrap();
        assert_eq!(p, Placement { x: 280, y: 0, width: 240, height: 480 });
    }

    #[test]
    fn exact_fit_fills_screen() {
        let p = fit_centered(800, 480, SCREEN).unwrap();
        assert_eq!(p, Placement { x: 0, y: 0, width: 800, height: 480 });
    }

    #[test]
    fn small_image_scaled_up() {
        let p = fit_centered(100, 60, SCREEN).unwrap();
        assert_eq!(p, Placement { x: 0, y: 0, width: 800, height: 480 });
    }

    #[test]
    fn aspect_preserved_within_a_pixel() {
        let p = fit_centered(4032, 3024, SCREEN).unwrap();
        let src = 4032.0 / 3024.0;
        let dst = p.width as f64 / p.height as f64;
        assert!((src - dst).abs() < 0.01);
        assert!(p.width <= 800 && p.height <= 480);
    }

    #[test]
    fn degenerate_sizes() {
        assert!(fit_centered(0, 10, SCREEN).is_none());
        assert!(fit_centered(10, 0, SCREEN).is_none());
        assert!(fit_centered(10, 10, ScreenSize::new(0, 480)).is_none());
    }

    #[test]
    fn pause_badge_sits_top_right() {
        let [left, right] = pause_badge(SCREEN);
        // 480 / 12 = 40 tall, 13 wide, 20 px margin
        assert_eq!(left.height, 40);
        assert_eq!(left.width, 13);
        assert_eq!(right.x + right.width as i32, 800 - 20);
        assert_eq!(right.x - left.x, 26);
        assert_eq!(left.y, 20);
        assert!(left.x > 400);
    }
}
