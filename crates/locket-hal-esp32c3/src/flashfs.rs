//! Internal flash volume: FAT on a dedicated data partition.
//!
//! The partition is written as a FAT16 image at manufacturing time (see
//! partitions.csv); the firmware never formats it. Writes go through a
//! read-modify-erase cycle per 4 KiB sector since NOR flash cannot
//! rewrite in place.

use core::cell::RefCell;

use embedded_sdmmc::{Block, BlockCount, BlockDevice, BlockIdx};
use esp_rom_sys::rom::spiflash::{
    ESP_ROM_SPIFLASH_RESULT_OK, esp_rom_spiflash_erase_sector, esp_rom_spiflash_read,
    esp_rom_spiflash_unlock, esp_rom_spiflash_write,
};
use log::{info, warn};

use crate::fat::FatStore;

/// Offset of the `storage` data partition (partitions.csv).
pub const STORAGE_PARTITION_OFFSET: u32 = 0x0011_0000;
/// Size of the `storage` data partition.
pub const STORAGE_PARTITION_BYTES: u32 = 0x002F_0000;

const FLASH_SECTOR_SIZE: u32 = 4096;
const BLOCK_SIZE: u32 = 512;
const BLOCKS_PER_SECTOR: usize = (FLASH_SECTOR_SIZE / BLOCK_SIZE) as usize;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FlashError {
    /// ROM flash call returned an error code.
    OpFailed(i32),
    OutOfRange,
}

/// Word-granular access to the SPI NOR flash through the ROM driver.
struct RawFlash;

impl RawFlash {
    fn new() -> Result<Self, FlashError> {
        let rc = unsafe { esp_rom_spiflash_unlock() };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashError::OpFailed(rc));
        }
        Ok(Self)
    }

    fn read_bytes(&self, addr: u32, out: &mut [u8]) -> Result<(), FlashError> {
        debug_assert!(addr % 4 == 0 && out.len() % 4 == 0);
        let rc = unsafe {
            esp_rom_spiflash_read(addr, out.as_mut_ptr() as *const u32, out.len() as u32)
        };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashError::OpFailed(rc));
        }
        Ok(())
    }

    fn write_bytes(&self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        debug_assert!(addr % 4 == 0 && data.len() % 4 == 0);
        let rc = unsafe { esp_rom_spiflash_write(addr, data.as_ptr() as *const u32, data.len() as u32) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashError::OpFailed(rc));
        }
        Ok(())
    }

    fn erase_sector(&self, addr: u32) -> Result<(), FlashError> {
        debug_assert!(addr % FLASH_SECTOR_SIZE == 0);
        let rc = unsafe { esp_rom_spiflash_erase_sector(addr / FLASH_SECTOR_SIZE) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashError::OpFailed(rc));
        }
        Ok(())
    }
}

/// Word-aligned sector scratch; the ROM driver transfers whole u32 words.
#[repr(align(4))]
struct SectorBuf([u8; FLASH_SECTOR_SIZE as usize]);

/// 512-byte block device over the storage partition.
pub struct FlashBlockDevice {
    flash: RawFlash,
    base: u32,
    blocks: u32,
    sector_buf: RefCell<SectorBuf>,
}

impl FlashBlockDevice {
    fn new(flash: RawFlash, base: u32, bytes: u32) -> Self {
        Self {
            flash,
            base,
            blocks: bytes / BLOCK_SIZE,
            sector_buf: RefCell::new(SectorBuf([0u8; FLASH_SECTOR_SIZE as usize])),
        }
    }

    fn block_addr(&self, block: BlockIdx) -> Result<u32, FlashError> {
        if block.0 >= self.blocks {
            return Err(FlashError::OutOfRange);
        }
        Ok(self.base + block.0 * BLOCK_SIZE)
    }
}

impl BlockDevice for FlashBlockDevice {
    type Error = FlashError;

    fn read(
        &self,
        blocks: &mut [Block],
        start_block_idx: BlockIdx,
        _reason: &str,
    ) -> Result<(), Self::Error> {
        for (i, block) in blocks.iter_mut().enumerate() {
            let addr = self.block_addr(BlockIdx(start_block_idx.0 + i as u32))?;

            let mut sector = self.sector_buf.borrow_mut();
            self.flash
                .read_bytes(addr, &mut sector.0[..BLOCK_SIZE as usize])?;
            block
                .contents
                .copy_from_slice(&sector.0[..BLOCK_SIZE as usize]);
        }
        Ok(())
    }

    fn write(&self, blocks: &[Block], start_block_idx: BlockIdx) -> Result<(), Self::Error> {
        for (i, block) in blocks.iter().enumerate() {
            let addr = self.block_addr(BlockIdx(start_block_idx.0 + i as u32))?;
            let sector_addr = addr & !(FLASH_SECTOR_SIZE - 1);
            let offset_in_sector = (addr - sector_addr) as usize;

            let mut sector = self.sector_buf.borrow_mut();
            self.flash.read_bytes(sector_addr, &mut sector.0)?;
            sector.0[offset_in_sector..offset_in_sector + BLOCK_SIZE as usize]
                .copy_from_slice(&block.contents);

            self.flash.erase_sector(sector_addr)?;
            self.flash.write_bytes(sector_addr, &sector.0)?;
        }
        Ok(())
    }

    fn num_blocks(&self) -> Result<BlockCount, Self::Error> {
        Ok(BlockCount(self.blocks))
    }
}

/// FAT store over the internal flash partition.
pub type InternalVolume = FatStore<FlashBlockDevice>;

/// Mounts the storage partition. A flash layer that fails to unlock
/// mounts not-ready; the modes degrade to their notices.
pub fn mount() -> InternalVolume {
    match RawFlash::new() {
        Ok(flash) => {
            info!(
                "flashfs: storage partition at {STORAGE_PARTITION_OFFSET:#x}, {} KiB",
                STORAGE_PARTITION_BYTES / 1024
            );
            let device =
                FlashBlockDevice::new(flash, STORAGE_PARTITION_OFFSET, STORAGE_PARTITION_BYTES);
            FatStore::new(device, true, u64::from(STORAGE_PARTITION_BYTES))
        }
        Err(error) => {
            warn!("flashfs: flash unlock failed: {error:?}");
            let device = FlashBlockDevice::new(
                RawFlash,
                STORAGE_PARTITION_OFFSET,
                STORAGE_PARTITION_BYTES,
            );
            FatStore::new(device, false, 0)
        }
    }
}

const _: () = {
    assert!(BLOCKS_PER_SECTOR == 8);
    assert!(STORAGE_PARTITION_OFFSET % FLASH_SECTOR_SIZE == 0);
};
