//! GPIO button debouncing with short/long press detection.
//!
//! Both buttons are active low with internal pull-ups. A press shorter
//! than the long threshold emits `Short` on release; holding past the
//! threshold emits `Long` once while still held.

use esp_hal::gpio::Input;
use locket_core::input::{Button, ButtonEvent, InputProvider};

const DEBOUNCE_MS: u64 = 30;
const LONG_PRESS_MS: u64 = 600;

#[derive(Clone, Copy, Default)]
struct ButtonState {
    pressed: bool,
    pressed_at_ms: u64,
    last_change_ms: u64,
    long_fired: bool,
}

impl ButtonState {
    fn step(&mut self, level_pressed: bool, now_ms: u64, button: Button) -> Option<ButtonEvent> {
        if level_pressed != self.pressed {
            if now_ms.saturating_sub(self.last_change_ms) < DEBOUNCE_MS {
                return None;
            }
            self.pressed = level_pressed;
            self.last_change_ms = now_ms;

            if level_pressed {
                self.pressed_at_ms = now_ms;
                self.long_fired = false;
                return None;
            }
            if !self.long_fired {
                return Some(ButtonEvent::Short(button));
            }
            return None;
        }

        if self.pressed
            && !self.long_fired
            && now_ms.saturating_sub(self.pressed_at_ms) >= LONG_PRESS_MS
        {
            self.long_fired = true;
            return Some(ButtonEvent::Long(button));
        }
        None
    }
}

pub struct Buttons {
    bottom: Input<'static>,
    top: Input<'static>,
    bottom_state: ButtonState,
    top_state: ButtonState,
}

impl Buttons {
    pub fn new(bottom: Input<'static>, top: Input<'static>) -> Self {
        Self {
            bottom,
            top,
            bottom_state: ButtonState::default(),
            top_state: ButtonState::default(),
        }
    }
}

impl InputProvider for Buttons {
    type Error = core::convert::Infallible;

    fn poll_event(&mut self, now_ms: u64) -> Result<Option<ButtonEvent>, Self::Error> {
        if let Some(event) = self
            .bottom_state
            .step(self.bottom.is_low(), now_ms, Button::Bottom)
        {
            return Ok(Some(event));
        }
        Ok(self.top_state.step(self.top.is_low(), now_ms, Button::Top))
    }
}
