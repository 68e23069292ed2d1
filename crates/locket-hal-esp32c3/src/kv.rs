//! Flash-backed settings records.
//!
//! A single reserved 4 KiB sector holds a magic/version header and a flat
//! table of namespaced integer records. Writes rewrite the whole sector;
//! at a handful of records and a few writes per day this stays far below
//! NOR endurance limits.

use esp_rom_sys::rom::spiflash::{
    ESP_ROM_SPIFLASH_RESULT_OK, esp_rom_spiflash_erase_sector, esp_rom_spiflash_read,
    esp_rom_spiflash_unlock, esp_rom_spiflash_write,
};
use heapless::Vec;
use locket_core::settings::KvStore;
use log::warn;

/// Offset of the reserved settings sector (partitions.csv, `settings`).
pub const SETTINGS_FLASH_OFFSET: u32 = 0x0000_9000;

const FLASH_SECTOR_SIZE: u32 = 4096;
const SETTINGS_MAGIC: u32 = 0x3156_4B4C; // "LKV1"
const SETTINGS_VERSION: u8 = 1;
const HEADER_LEN: usize = 8;
const NAME_BYTES: usize = 14;
const RECORD_LEN: usize = NAME_BYTES * 2 + 4;
const MAX_RECORDS: usize = 32;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FlashKvError {
    FlashOpFailed(i32),
    TableFull,
    KeyTooLong,
}

#[derive(Clone, Copy)]
struct Record {
    namespace: [u8; NAME_BYTES],
    key: [u8; NAME_BYTES],
    value: i32,
}

impl Record {
    fn matches(&self, namespace: &str, key: &str) -> bool {
        name_matches(&self.namespace, namespace) && name_matches(&self.key, key)
    }
}

fn name_matches(stored: &[u8; NAME_BYTES], wanted: &str) -> bool {
    let trimmed_len = stored.iter().position(|&b| b == 0).unwrap_or(NAME_BYTES);
    &stored[..trimmed_len] == wanted.as_bytes()
}

fn pack_name(name: &str) -> Result<[u8; NAME_BYTES], FlashKvError> {
    if name.len() > NAME_BYTES {
        return Err(FlashKvError::KeyTooLong);
    }
    let mut out = [0u8; NAME_BYTES];
    out[..name.len()].copy_from_slice(name.as_bytes());
    Ok(out)
}

/// Word-aligned image of the settings table; the ROM driver transfers
/// whole u32 words.
#[repr(align(4))]
struct TableBuf([u8; HEADER_LEN + MAX_RECORDS * RECORD_LEN]);

impl TableBuf {
    const fn zeroed() -> Self {
        Self([0u8; HEADER_LEN + MAX_RECORDS * RECORD_LEN])
    }
}

pub struct FlashKv {
    records: Vec<Record, MAX_RECORDS>,
    loaded: bool,
}

impl FlashKv {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            loaded: false,
        }
    }

    fn flash_op(rc: i32) -> Result<(), FlashKvError> {
        if rc == ESP_ROM_SPIFLASH_RESULT_OK {
            Ok(())
        } else {
            Err(FlashKvError::FlashOpFailed(rc))
        }
    }

    fn ensure_loaded(&mut self) -> Result<(), FlashKvError> {
        if self.loaded {
            return Ok(());
        }

        Self::flash_op(unsafe { esp_rom_spiflash_unlock() })?;

        let mut table = TableBuf::zeroed();
        Self::flash_op(unsafe {
            esp_rom_spiflash_read(
                SETTINGS_FLASH_OFFSET,
                table.0.as_mut_ptr() as *const u32,
                table.0.len() as u32,
            )
        })?;
        let sector = &table.0;

        self.records.clear();
        self.loaded = true;

        let magic = u32::from_le_bytes([sector[0], sector[1], sector[2], sector[3]]);
        if magic != SETTINGS_MAGIC || sector[4] != SETTINGS_VERSION {
            // Blank or foreign sector; start empty and claim it on the
            // first write.
            return Ok(());
        }

        let count = (sector[5] as usize).min(MAX_RECORDS);
        for slot in 0..count {
            let at = HEADER_LEN + slot * RECORD_LEN;
            let mut namespace = [0u8; NAME_BYTES];
            let mut key = [0u8; NAME_BYTES];
            namespace.copy_from_slice(&sector[at..at + NAME_BYTES]);
            key.copy_from_slice(&sector[at + NAME_BYTES..at + 2 * NAME_BYTES]);
            let value = i32::from_le_bytes([
                sector[at + 2 * NAME_BYTES],
                sector[at + 2 * NAME_BYTES + 1],
                sector[at + 2 * NAME_BYTES + 2],
                sector[at + 2 * NAME_BYTES + 3],
            ]);
            let _ = self.records.push(Record {
                namespace,
                key,
                value,
            });
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<(), FlashKvError> {
        let mut table = TableBuf::zeroed();
        let sector = &mut table.0;
        sector[0..4].copy_from_slice(&SETTINGS_MAGIC.to_le_bytes());
        sector[4] = SETTINGS_VERSION;
        sector[5] = self.records.len() as u8;

        for (slot, record) in self.records.iter().enumerate() {
            let at = HEADER_LEN + slot * RECORD_LEN;
            sector[at..at + NAME_BYTES].copy_from_slice(&record.namespace);
            sector[at + NAME_BYTES..at + 2 * NAME_BYTES].copy_from_slice(&record.key);
            sector[at + 2 * NAME_BYTES..at + 2 * NAME_BYTES + 4]
                .copy_from_slice(&record.value.to_le_bytes());
        }

        Self::flash_op(unsafe {
            esp_rom_spiflash_erase_sector(SETTINGS_FLASH_OFFSET / FLASH_SECTOR_SIZE)
        })?;
        Self::flash_op(unsafe {
            esp_rom_spiflash_write(
                SETTINGS_FLASH_OFFSET,
                table.0.as_ptr() as *const u32,
                table.0.len() as u32,
            )
        })
    }
}

impl Default for FlashKv {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for FlashKv {
    type Error = FlashKvError;

    fn get_i32(&mut self, namespace: &str, key: &str) -> Result<Option<i32>, Self::Error> {
        self.ensure_loaded()?;
        Ok(self
            .records
            .iter()
            .find(|r| r.matches(namespace, key))
            .map(|r| r.value))
    }

    fn put_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<(), Self::Error> {
        self.ensure_loaded()?;

        if let Some(record) = self.records.iter_mut().find(|r| r.matches(namespace, key)) {
            if record.value == value {
                return Ok(());
            }
            record.value = value;
        } else {
            let record = Record {
                namespace: pack_name(namespace)?,
                key: pack_name(key)?,
                value,
            };
            if self.records.push(record).is_err() {
                warn!("kv: record table full, dropping {namespace}/{key}");
                return Err(FlashKvError::TableFull);
            }
        }

        self.persist()
    }
}
