//! Orbiting-dots animation mode.

use embedded_graphics::{
    pixelcolor::Rgb332,
    prelude::*,
    primitives::{Circle, PrimitiveStyle},
};
use libm::{cosf, sinf};

use crate::canvas::{CENTER_X, CENTER_Y};
use crate::input::Button;
use crate::render::{BG, DIM, TITLE_ORANGE};
use crate::shell::{Mode, Platform, Services};

pub const MAX_ORBITERS: usize = 8;
const INITIAL_ORBITERS: usize = 3;
const DOT_DIAMETER: u32 = 11;
const FRAME_INTERVAL_MS: u64 = 33;

const ORBIT_RING: Rgb332 = Rgb332::new(1, 1, 1);

const PALETTE: [Rgb332; MAX_ORBITERS] = [
    Rgb332::RED,
    Rgb332::GREEN,
    Rgb332::CYAN,
    Rgb332::MAGENTA,
    Rgb332::YELLOW,
    TITLE_ORANGE,
    Rgb332::new(7, 4, 2),
    Rgb332::WHITE,
];

#[derive(Clone, Copy)]
struct Orbiter {
    angle: f32,
    speed: f32,
    radius: f32,
    color: Rgb332,
}

impl Orbiter {
    fn initial(index: usize) -> Self {
        Self {
            angle: core::f32::consts::TAU / MAX_ORBITERS as f32 * index as f32,
            speed: 0.02 + 0.015 * index as f32,
            radius: 30.0 + 15.0 * index as f32,
            color: PALETTE[index % PALETTE.len()],
        }
    }

    fn position(&self) -> Point {
        Point::new(
            CENTER_X + (cosf(self.angle) * self.radius) as i32,
            CENTER_Y + (sinf(self.angle) * self.radius) as i32,
        )
    }
}

pub struct OrbitsMode {
    orbiters: [Orbiter; MAX_ORBITERS],
    active: usize,
    paused: bool,
    last_frame_ms: u64,
}

impl OrbitsMode {
    pub fn new() -> Self {
        Self {
            orbiters: core::array::from_fn(Orbiter::initial),
            active: INITIAL_ORBITERS,
            paused: false,
            last_frame_ms: 0,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn reset(&mut self) {
        self.orbiters = core::array::from_fn(Orbiter::initial);
    }

    fn draw<P: Platform>(&self, svc: &mut Services<'_, P>) {
        let frame = &mut *svc.frame;
        frame.fill(BG);

        for orbiter in &self.orbiters[..self.active] {
            let _ = Circle::with_center(
                Point::new(CENTER_X, CENTER_Y),
                orbiter.radius as u32 * 2 + 1,
            )
            .into_styled(PrimitiveStyle::with_stroke(ORBIT_RING, 1))
            .draw(frame);
        }

        for orbiter in &self.orbiters[..self.active] {
            let _ = Circle::with_center(orbiter.position(), DOT_DIAMETER)
                .into_styled(PrimitiveStyle::with_fill(orbiter.color))
                .draw(frame);
        }

        let _ = Circle::with_center(Point::new(CENTER_X, CENTER_Y), 5)
            .into_styled(PrimitiveStyle::with_fill(DIM))
            .draw(frame);

        svc.present();
    }
}

impl Default for OrbitsMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Mode for OrbitsMode {
    fn name(&self) -> &'static str {
        "Orbits"
    }

    fn enter<P: Platform>(&mut self, svc: &mut Services<'_, P>, now_ms: u64) {
        self.active = INITIAL_ORBITERS;
        self.paused = false;
        self.last_frame_ms = now_ms;
        self.reset();
        self.draw(svc);
    }

    fn update<P: Platform>(&mut self, svc: &mut Services<'_, P>, now_ms: u64) {
        if self.paused {
            return;
        }
        if now_ms.saturating_sub(self.last_frame_ms) < FRAME_INTERVAL_MS {
            return;
        }
        self.last_frame_ms = now_ms;

        for orbiter in &mut self.orbiters[..self.active] {
            orbiter.angle += orbiter.speed;
            if orbiter.angle > core::f32::consts::TAU {
                orbiter.angle -= core::f32::consts::TAU;
            }
        }
        self.draw(svc);
    }

    fn on_button<P: Platform>(&mut self, svc: &mut Services<'_, P>, button: Button, _now_ms: u64) {
        match button {
            Button::Bottom => {
                if self.active < MAX_ORBITERS {
                    self.active += 1;
                } else {
                    self.active = 1;
                    self.reset();
                }
                self.draw(svc);
            }
            Button::Top => {
                self.paused = !self.paused;
            }
        }
    }
}
