//! Shared test platform wiring.

use crate::display::NullSink;
use crate::settings::MemKv;
use crate::shell::Platform;
use crate::storage::mem::MemVolume;

pub(crate) struct TestPlatform {
    pub sink: NullSink,
    pub sd: MemVolume,
    pub flash: MemVolume,
    pub kv: MemKv,
}

impl TestPlatform {
    pub fn new() -> Self {
        Self {
            sink: NullSink::new(),
            sd: MemVolume::new(),
            flash: MemVolume::new(),
            kv: MemKv::new(),
        }
    }

    pub fn with_flash_capacity(capacity: u64) -> Self {
        let mut platform = Self::new();
        platform.flash = MemVolume::with_capacity(capacity);
        platform
    }
}

impl Platform for TestPlatform {
    type Sink = NullSink;
    type Removable = MemVolume;
    type Internal = MemVolume;
    type Store = MemKv;

    fn display(&mut self) -> &mut Self::Sink {
        &mut self.sink
    }

    fn removable(&mut self) -> &mut Self::Removable {
        &mut self.sd
    }

    fn internal(&mut self) -> &mut Self::Internal {
        &mut self.flash
    }

    fn store(&mut self) -> &mut Self::Store {
        &mut self.kv
    }
}
