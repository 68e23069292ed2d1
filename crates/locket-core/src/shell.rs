//! Mode shell: platform bundle, services boundary, and mode dispatch.
//!
//! The mode set is fixed at build time. The shell owns the persistent frame
//! canvas and the five mode states, routes ticks and short presses to the
//! active mode, and cycles modes on a long press. The active mode index is
//! persisted the same way the per-mode indices are.

use log::{info, warn};

use crate::canvas::{FrameCanvas, LineCanvas};
use crate::display::DisplaySink;
use crate::input::{Button, ButtonEvent};
use crate::modes::counter::CounterMode;
use crate::modes::intake::IntakeMode;
use crate::modes::orbits::OrbitsMode;
use crate::modes::photos::PhotosMode;
use crate::modes::poems::{PoemsMode, ScrollConfig};
use crate::settings::KvStore;
use crate::storage::{Volume, VolumeMut};

const SHELL_NAMESPACE: &str = "modes";
const KEY_INDEX: &str = "idx";

/// Board capabilities the modes consume.
pub trait Platform {
    type Sink: DisplaySink;
    type Removable: Volume;
    type Internal: VolumeMut;
    type Store: KvStore;

    fn display(&mut self) -> &mut Self::Sink;
    fn removable(&mut self) -> &mut Self::Removable;
    fn internal(&mut self) -> &mut Self::Internal;
    fn store(&mut self) -> &mut Self::Store;
}

/// Per-call service bundle handed to the active mode.
pub struct Services<'a, P: Platform> {
    pub platform: &'a mut P,
    pub frame: &'a mut FrameCanvas,
}

impl<'a, P: Platform> Services<'a, P> {
    /// Pushes the frame canvas to the panel, logging instead of failing.
    pub fn present(&mut self) {
        if let Err(error) = self.platform.display().push_frame(self.frame) {
            warn!("display push failed: {error:?}");
        }
    }

    /// Reads a persisted index, clamped into `0..count`; anything invalid
    /// or out of range silently resolves to 0.
    pub fn restore_index(&mut self, namespace: &str, count: usize) -> usize {
        let stored = self
            .platform
            .store()
            .get_i32(namespace, KEY_INDEX)
            .ok()
            .flatten()
            .unwrap_or(0);
        if stored >= 0 && (stored as usize) < count {
            stored as usize
        } else {
            0
        }
    }

    /// Persists an index, logging instead of failing.
    pub fn persist_index(&mut self, namespace: &str, index: usize) {
        if let Err(error) = self
            .platform
            .store()
            .put_i32(namespace, KEY_INDEX, index as i32)
        {
            warn!("persist {namespace}/{KEY_INDEX} failed: {error:?}");
        }
    }
}

/// One display mode. All state is owned by the implementor; the shell only
/// drives these callbacks from its single tick/input path.
pub trait Mode {
    fn name(&self) -> &'static str;

    /// Called when the mode becomes active.
    fn enter<P: Platform>(&mut self, svc: &mut Services<'_, P>, now_ms: u64);

    /// Called once per main loop iteration while active.
    fn update<P: Platform>(&mut self, svc: &mut Services<'_, P>, now_ms: u64);

    /// Called on a short press while active.
    fn on_button<P: Platform>(&mut self, svc: &mut Services<'_, P>, button: Button, now_ms: u64);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ModeId {
    Counter,
    Orbits,
    Photos,
    Poems,
    Intake,
}

impl ModeId {
    pub const ALL: [ModeId; 5] = [
        ModeId::Counter,
        ModeId::Orbits,
        ModeId::Photos,
        ModeId::Poems,
        ModeId::Intake,
    ];

    pub const fn next(self) -> Self {
        match self {
            Self::Counter => Self::Orbits,
            Self::Orbits => Self::Photos,
            Self::Photos => Self::Poems,
            Self::Poems => Self::Intake,
            Self::Intake => Self::Counter,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Counter => 0,
            Self::Orbits => 1,
            Self::Photos => 2,
            Self::Poems => 3,
            Self::Intake => 4,
        }
    }

    pub const fn from_index(index: usize) -> Self {
        match index {
            1 => Self::Orbits,
            2 => Self::Photos,
            3 => Self::Poems,
            4 => Self::Intake,
            _ => Self::Counter,
        }
    }
}

/// The outer mode-switching shell.
pub struct Shell {
    frame: FrameCanvas,
    active: ModeId,
    started: bool,
    counter: CounterMode,
    orbits: OrbitsMode,
    photos: PhotosMode,
    poems: PoemsMode,
    intake: IntakeMode,
}

impl Shell {
    pub fn new() -> Self {
        Self::with_scroll_config(ScrollConfig::default())
    }

    pub fn with_scroll_config(scroll: ScrollConfig) -> Self {
        Self {
            frame: FrameCanvas::new(),
            active: ModeId::Counter,
            started: false,
            counter: CounterMode::new(),
            orbits: OrbitsMode::new(),
            photos: PhotosMode::new(),
            poems: PoemsMode::new(scroll, Some(LineCanvas::new())),
            intake: IntakeMode::new(),
        }
    }

    pub fn active(&self) -> ModeId {
        self.active
    }

    /// Drives the active mode once. The first call restores the persisted
    /// mode and enters it.
    pub fn tick<P: Platform>(&mut self, platform: &mut P, now_ms: u64) {
        if !self.started {
            self.started = true;
            let index = {
                let mut svc = Services {
                    platform: &mut *platform,
                    frame: &mut self.frame,
                };
                svc.restore_index(SHELL_NAMESPACE, ModeId::ALL.len())
            };
            self.active = ModeId::from_index(index);
            self.enter_active(&mut *platform, now_ms);
        }

        let mut svc = Services {
            platform,
            frame: &mut self.frame,
        };
        match self.active {
            ModeId::Counter => self.counter.update(&mut svc, now_ms),
            ModeId::Orbits => self.orbits.update(&mut svc, now_ms),
            ModeId::Photos => self.photos.update(&mut svc, now_ms),
            ModeId::Poems => self.poems.update(&mut svc, now_ms),
            ModeId::Intake => self.intake.update(&mut svc, now_ms),
        }
    }

    /// Routes a debounced button event.
    pub fn on_event<P: Platform>(&mut self, platform: &mut P, event: ButtonEvent, now_ms: u64) {
        match event {
            ButtonEvent::Long(_) => {
                self.active = self.active.next();
                info!("mode -> {}", self.active_name());
                {
                    let mut svc = Services {
                        platform: &mut *platform,
                        frame: &mut self.frame,
                    };
                    svc.persist_index(SHELL_NAMESPACE, self.active.index());
                }
                self.enter_active(platform, now_ms);
            }
            ButtonEvent::Short(button) => {
                let mut svc = Services {
                    platform,
                    frame: &mut self.frame,
                };
                match self.active {
                    ModeId::Counter => self.counter.on_button(&mut svc, button, now_ms),
                    ModeId::Orbits => self.orbits.on_button(&mut svc, button, now_ms),
                    ModeId::Photos => self.photos.on_button(&mut svc, button, now_ms),
                    ModeId::Poems => self.poems.on_button(&mut svc, button, now_ms),
                    ModeId::Intake => self.intake.on_button(&mut svc, button, now_ms),
                }
            }
        }
    }

    fn enter_active<P: Platform>(&mut self, platform: &mut P, now_ms: u64) {
        let mut svc = Services {
            platform,
            frame: &mut self.frame,
        };
        match self.active {
            ModeId::Counter => self.counter.enter(&mut svc, now_ms),
            ModeId::Orbits => self.orbits.enter(&mut svc, now_ms),
            ModeId::Photos => self.photos.enter(&mut svc, now_ms),
            ModeId::Poems => self.poems.enter(&mut svc, now_ms),
            ModeId::Intake => self.intake.enter(&mut svc, now_ms),
        }
    }

    fn active_name(&self) -> &'static str {
        match self.active {
            ModeId::Counter => self.counter.name(),
            ModeId::Orbits => self.orbits.name(),
            ModeId::Photos => self.photos.name(),
            ModeId::Poems => self.poems.name(),
            ModeId::Intake => self.intake.name(),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Button;
    use crate::testutil::TestPlatform;

    #[test]
    fn first_tick_enters_the_persisted_mode() {
        let mut platform = TestPlatform::new();
        platform.kv.put_i32(SHELL_NAMESPACE, KEY_INDEX, 3).unwrap();

        let mut shell = Shell::new();
        shell.tick(&mut platform, 0);
        assert_eq!(shell.active(), ModeId::Poems);
    }

    #[test]
    fn out_of_range_persisted_mode_resolves_to_the_first() {
        let mut platform = TestPlatform::new();
        platform.kv.put_i32(SHELL_NAMESPACE, KEY_INDEX, 99).unwrap();

        let mut shell = Shell::new();
        shell.tick(&mut platform, 0);
        assert_eq!(shell.active(), ModeId::Counter);
    }

    #[test]
    fn long_press_cycles_and_persists_the_mode() {
        let mut platform = TestPlatform::new();
        let mut shell = Shell::new();
        shell.tick(&mut platform, 0);

        shell.on_event(&mut platform, ButtonEvent::Long(Button::Top), 10);
        assert_eq!(shell.active(), ModeId::Orbits);
        assert_eq!(platform.kv.get_i32(SHELL_NAMESPACE, KEY_INDEX), Ok(Some(1)));

        for _ in 0..4 {
            shell.on_event(&mut platform, ButtonEvent::Long(Button::Top), 20);
        }
        assert_eq!(shell.active(), ModeId::Counter);
        assert_eq!(platform.kv.get_i32(SHELL_NAMESPACE, KEY_INDEX), Ok(Some(0)));
    }

    #[test]
    fn short_presses_reach_the_active_mode() {
        let mut platform = TestPlatform::new();
        let mut shell = Shell::new();
        shell.tick(&mut platform, 0);

        // Counter mode is active; presses bump its tallies.
        shell.on_event(&mut platform, ButtonEvent::Short(Button::Bottom), 5);
        shell.on_event(&mut platform, ButtonEvent::Short(Button::Bottom), 6);
        shell.on_event(&mut platform, ButtonEvent::Short(Button::Top), 7);
        assert_eq!(shell.counter.presses(), (2, 1));
    }

    #[test]
    fn mode_order_wraps_through_all_five() {
        let mut id = ModeId::Counter;
        let mut seen = std::vec::Vec::new();
        for _ in 0..5 {
            seen.push(id);
            id = id.next();
        }
        assert_eq!(id, ModeId::Counter);
        assert_eq!(seen, ModeId::ALL);
    }
}
