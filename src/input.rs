//! Mapping raw input to slideshow actions. Kept free of SDL types so it can be
//! tested without a display.

use crate::nav::Trigger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    Nav(Trigger),
}

/// Touch zones: left third = back, middle third = pause, right third = forward.
/// Touches arrive as SDL's synthesized mouse presses, in window coordinates.
pub fn zone_action(x: i32, screen_width: u32) -> Action {
    let x = i64::from(x.max(0));
    let w = i64::from(screen_width);
    let trigger = if 3 * x < w {
        Trigger::Back
    } else if 3 * x < 2 * w {
        Trigger::TogglePause
    } else {
        Trigger::Forward
    };
    Action::Nav(trigger)
}

/// Key names as SDL reports them (`Keycode::name()`).
pub fn key_action(name: &str) -> Option<Action> {
    match name {
        "Escape" | "Q" => Some(Action::Quit),
        "Left" => Some(Action::Nav(Trigger::Back)),
        "Right" => Some(Action::Nav(Trigger::Forward)),
        "Space" | "P" => Some(Action::Nav(Trigger::TogglePause)),
        _ => None,
    }
}
