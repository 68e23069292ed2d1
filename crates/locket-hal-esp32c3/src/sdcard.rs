//! SD card volume on the shared SPI bus.

use embedded_hal::spi::SpiDevice;
use embedded_sdmmc::SdCard;
use esp_hal::delay::Delay;
use log::{info, warn};

use crate::fat::FatStore;

/// FAT store over the removable card.
pub type SdVolume<SPI> = FatStore<SdCard<SPI, Delay>>;

/// Probes the card and wraps it in a [`SdVolume`].
///
/// A missing or unreadable card is not fatal; the volume mounts not-ready
/// and the modes degrade to their notices.
pub fn mount<SPI>(spi: SPI, delay: Delay) -> SdVolume<SPI>
where
    SPI: SpiDevice<u8>,
{
    let card = SdCard::new(spi, delay);
    let (ready, capacity) = match card.num_bytes() {
        Ok(bytes) => {
            info!("sd: {} MiB card", bytes / (1024 * 1024));
            (true, bytes)
        }
        Err(error) => {
            warn!("sd: no usable card: {error:?}");
            (false, 0)
        }
    };

    FatStore::new(card, ready, capacity)
}
