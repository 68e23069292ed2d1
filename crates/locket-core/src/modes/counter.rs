//! Button-counter demo mode.

use core::fmt::Write;

use heapless::String;

use crate::input::Button;
use crate::render::{self, ACCENT, BG, DIM, FONT_LARGE, FONT_SMALL, TEXT};
use crate::shell::{Mode, Platform, Services};

pub struct CounterMode {
    bottom: u32,
    top: u32,
}

impl CounterMode {
    pub const fn new() -> Self {
        Self { bottom: 0, top: 0 }
    }

    pub fn presses(&self) -> (u32, u32) {
        (self.bottom, self.top)
    }

    fn draw<P: Platform>(&self, svc: &mut Services<'_, P>) {
        svc.frame.fill(BG);
        render::draw_ring(svc.frame);

        render::draw_centered(svc.frame, &FONT_LARGE, TEXT, "Locket", 40);
        render::draw_centered(svc.frame, &FONT_SMALL, TEXT, "GC9A01 240x240", 75);

        let mut caption: String<32> = String::new();
        let _ = write!(caption, "Bottom: {}", self.bottom);
        render::draw_centered(svc.frame, &FONT_LARGE, ACCENT, caption.as_str(), 120);

        caption.clear();
        let _ = write!(caption, "Top: {}", self.top);
        render::draw_centered(svc.frame, &FONT_LARGE, ACCENT, caption.as_str(), 155);

        render::draw_centered(svc.frame, &FONT_SMALL, DIM, "Press buttons!", 200);
        svc.present();
    }
}

impl Default for CounterMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Mode for CounterMode {
    fn name(&self) -> &'static str {
        "Counter"
    }

    fn enter<P: Platform>(&mut self, svc: &mut Services<'_, P>, _now_ms: u64) {
        self.bottom = 0;
        self.top = 0;
        self.draw(svc);
    }

    fn update<P: Platform>(&mut self, _svc: &mut Services<'_, P>, _now_ms: u64) {
        // Static screen, nothing to animate.
    }

    fn on_button<P: Platform>(&mut self, svc: &mut Services<'_, P>, button: Button, _now_ms: u64) {
        match button {
            Button::Bottom => self.bottom += 1,
            Button::Top => self.top += 1,
        }
        self.draw(svc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestPlatform;

    fn svc_call(platform: &mut TestPlatform, f: impl FnOnce(&mut Services<'_, TestPlatform>)) {
        let mut frame = crate::canvas::FrameCanvas::new();
        let mut svc = Services {
            platform,
            frame: &mut frame,
        };
        f(&mut svc);
    }

    #[test]
    fn presses_tally_per_button_and_reset_on_enter() {
        let mut platform = TestPlatform::new();
        let mut mode = CounterMode::new();

        svc_call(&mut platform, |svc| mode.enter(svc, 0));
        svc_call(&mut platform, |svc| mode.on_button(svc, Button::Bottom, 1));
        svc_call(&mut platform, |svc| mode.on_button(svc, Button::Bottom, 2));
        svc_call(&mut platform, |svc| mode.on_button(svc, Button::Top, 3));
        assert_eq!(mode.presses(), (2, 1));

        svc_call(&mut platform, |svc| mode.enter(svc, 4));
        assert_eq!(mode.presses(), (0, 0));
        assert!(platform.sink.frames_pushed >= 5);
    }
}
