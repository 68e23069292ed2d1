//! ESP32-C3 board glue for the Locket firmware.
//!
//! Implements the locket-core platform traits on esp-hal: the SPI panel
//! sink, GPIO button debouncing, the SD card volume, the internal flash
//! volume, and flash-backed settings records.

#![no_std]

pub mod buttons;
pub mod display;
pub mod fat;
pub mod flashfs;
pub mod kv;
pub mod sdcard;

use locket_core::shell::Platform;

/// Concrete platform bundle handed to the shell.
pub struct Board<SPI, DC, RST, SDSPI>
where
    SPI: embedded_hal::spi::SpiDevice<u8>,
    DC: embedded_hal::digital::OutputPin,
    RST: embedded_hal::digital::OutputPin,
    SDSPI: embedded_hal::spi::SpiDevice<u8>,
{
    pub panel: display::PanelDisplay<SPI, DC, RST>,
    pub sd: sdcard::SdVolume<SDSPI>,
    pub flash: flashfs::InternalVolume,
    pub settings: kv::FlashKv,
}

impl<SPI, DC, RST, SDSPI> Platform for Board<SPI, DC, RST, SDSPI>
where
    SPI: embedded_hal::spi::SpiDevice<u8>,
    DC: embedded_hal::digital::OutputPin,
    RST: embedded_hal::digital::OutputPin,
    SDSPI: embedded_hal::spi::SpiDevice<u8>,
{
    type Sink = display::PanelDisplay<SPI, DC, RST>;
    type Removable = sdcard::SdVolume<SDSPI>;
    type Internal = flashfs::InternalVolume;
    type Store = kv::FlashKv;

    fn display(&mut self) -> &mut Self::Sink {
        &mut self.panel
    }

    fn removable(&mut self) -> &mut Self::Removable {
        &mut self.sd
    }

    fn internal(&mut self) -> &mut Self::Internal {
        &mut self.flash
    }

    fn store(&mut self) -> &mut Self::Store {
        &mut self.settings
    }
}
