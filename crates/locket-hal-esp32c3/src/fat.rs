//! Shared FAT volume plumbing for the SD card and internal flash.
//!
//! Both media expose the same flat layout (content folders directly under
//! the root), so one [`FatStore`] implements the core volume traits for
//! any block device.

use core::fmt::Write as _;

use embedded_sdmmc::{
    BlockDevice, Error as FsError, Mode, ShortFileName, TimeSource, Timestamp, VolumeIdx,
    VolumeManager,
};
use heapless::String;
use locket_core::storage::{
    DirEntry, DirListing, ENTRY_NAME_BYTES, EntryKind, Volume, VolumeMut, classify_name,
};

/// Folders whose contents count toward `used_bytes`; the device keeps its
/// entire payload in these.
const CONTENT_FOLDERS: &[&str] = &["/birthday", "/poems"];

/// Fixed timestamp source used until RTC time integration is added.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedTimeSource;

impl TimeSource for FixedTimeSource {
    fn get_timestamp(&self) -> Timestamp {
        // 2026-01-01 00:00:00
        Timestamp {
            year_since_1970: 56,
            zero_indexed_month: 0,
            zero_indexed_day: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }
}

#[derive(Debug)]
pub enum FatError<E: core::fmt::Debug> {
    NotReady,
    BadPath,
    Filesystem(FsError<E>),
}

impl<E: core::fmt::Debug> From<FsError<E>> for FatError<E> {
    fn from(error: FsError<E>) -> Self {
        Self::Filesystem(error)
    }
}

/// FAT filesystem behind one of the core volume traits.
pub struct FatStore<D>
where
    D: BlockDevice,
    D::Error: core::fmt::Debug,
{
    mgr: VolumeManager<D, FixedTimeSource>,
    ready: bool,
    capacity_bytes: u64,
}

impl<D> FatStore<D>
where
    D: BlockDevice,
    D::Error: core::fmt::Debug,
{
    pub(crate) fn new(device: D, ready: bool, capacity_bytes: u64) -> Self {
        Self {
            mgr: VolumeManager::new(device, FixedTimeSource),
            ready,
            capacity_bytes,
        }
    }

    pub fn volume_manager(&mut self) -> &mut VolumeManager<D, FixedTimeSource> {
        &mut self.mgr
    }

    fn check_ready(&self) -> Result<(), FatError<D::Error>> {
        if self.ready {
            Ok(())
        } else {
            Err(FatError::NotReady)
        }
    }

    fn folder_size(&mut self, folder: &str) -> u64 {
        match self.list_dir(folder) {
            Ok(listing) => listing.iter().map(|e| u64::from(e.size)).sum(),
            Err(_) => 0,
        }
    }
}

/// Splits `/folder/name.ext` into folder and base components.
fn split_path(path: &str) -> Result<(&str, &str), ()> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.rsplit_once('/') {
        Some((folder, base)) if !base.is_empty() => Ok((folder, base)),
        Some(_) => Err(()),
        // Single component: a file in the volume root.
        None => Ok(("", trimmed)),
    }
}

fn folder_component(folder: &str) -> &str {
    folder.trim_start_matches('/').trim_end_matches('/')
}

fn entry_name(name: &ShortFileName) -> String<ENTRY_NAME_BYTES> {
    let mut out = String::new();
    let _ = write!(out, "{name}");
    out
}

impl<D> Volume for FatStore<D>
where
    D: BlockDevice,
    D::Error: core::fmt::Debug,
{
    type Error = FatError<D::Error>;

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn list_dir(&mut self, folder: &str) -> Result<DirListing, Self::Error> {
        self.check_ready()?;

        let mut listing = DirListing::new();
        let mut volume = self.mgr.open_volume(VolumeIdx(0))?;
        let mut root = volume.open_root_dir()?;

        let component = folder_component(folder);
        let mut dir = if component.is_empty() {
            root
        } else {
            match root.open_dir(component) {
                Ok(dir) => dir,
                Err(FsError::NotFound) => return Ok(listing),
                Err(error) => return Err(error.into()),
            }
        };

        dir.iterate_dir(|entry| {
            if listing.is_full() {
                return;
            }
            let name = entry_name(&entry.name);
            let kind = if entry.attributes.is_directory() {
                EntryKind::Directory
            } else {
                classify_name(name.as_str())
            };
            let _ = listing.push(DirEntry {
                name,
                kind,
                size: entry.size,
            });
        })?;

        Ok(listing)
    }

    fn stat(&mut self, path: &str) -> Result<Option<DirEntry>, Self::Error> {
        self.check_ready()?;

        let (folder, base) = split_path(path).map_err(|_| FatError::BadPath)?;
        let Ok(wanted) = ShortFileName::create_from_str(base) else {
            return Err(FatError::BadPath);
        };

        let mut volume = self.mgr.open_volume(VolumeIdx(0))?;
        let mut root = volume.open_root_dir()?;
        let mut dir = if folder.is_empty() {
            root
        } else {
            match root.open_dir(folder) {
                Ok(dir) => dir,
                Err(FsError::NotFound) => return Ok(None),
                Err(error) => return Err(error.into()),
            }
        };

        let mut found = None;
        dir.iterate_dir(|entry| {
            if found.is_some() || entry.name != wanted {
                return;
            }
            let name = entry_name(&entry.name);
            let kind = if entry.attributes.is_directory() {
                EntryKind::Directory
            } else {
                classify_name(name.as_str())
            };
            found = Some(DirEntry {
                name,
                kind,
                size: entry.size,
            });
        })?;

        Ok(found)
    }

    fn read(&mut self, path: &str, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.check_ready()?;

        let (folder, base) = split_path(path).map_err(|_| FatError::BadPath)?;
        let mut volume = self.mgr.open_volume(VolumeIdx(0))?;
        let mut root = volume.open_root_dir()?;
        let mut dir = if folder.is_empty() {
            root
        } else {
            root.open_dir(folder)?
        };

        let mut file = dir.open_file_in_dir(base, Mode::ReadOnly)?;
        if offset >= file.length() {
            return Ok(0);
        }
        file.seek_from_start(offset)?;

        let mut total = 0usize;
        while total < buf.len() {
            let read_now = file.read(&mut buf[total..])?;
            if read_now == 0 {
                break;
            }
            total += read_now;
        }
        Ok(total)
    }
}

impl<D> VolumeMut for FatStore<D>
where
    D: BlockDevice,
    D::Error: core::fmt::Debug,
{
    fn make_dir(&mut self, path: &str) -> Result<(), Self::Error> {
        self.check_ready()?;

        let component = folder_component(path);
        let mut volume = self.mgr.open_volume(VolumeIdx(0))?;
        let mut root = volume.open_root_dir()?;
        match root.make_dir_in_dir(component) {
            Ok(()) | Err(FsError::DirAlreadyExists) => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error> {
        self.check_ready()?;

        let (folder, base) = split_path(path).map_err(|_| FatError::BadPath)?;
        let mut volume = self.mgr.open_volume(VolumeIdx(0))?;
        let mut root = volume.open_root_dir()?;
        let mut dir = if folder.is_empty() {
            root
        } else {
            root.open_dir(folder)?
        };

        let mut file = dir.open_file_in_dir(base, Mode::ReadWriteCreateOrTruncate)?;
        file.write(data)?;
        file.close()?;
        Ok(())
    }

    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error> {
        self.check_ready()?;

        let (folder, base) = split_path(path).map_err(|_| FatError::BadPath)?;
        let mut volume = self.mgr.open_volume(VolumeIdx(0))?;
        let mut root = volume.open_root_dir()?;
        let mut dir = if folder.is_empty() {
            root
        } else {
            root.open_dir(folder)?
        };

        let mut file = dir.open_file_in_dir(base, Mode::ReadWriteCreateOrAppend)?;
        file.write(data)?;
        file.close()?;
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<(), Self::Error> {
        self.check_ready()?;

        let (folder, base) = split_path(path).map_err(|_| FatError::BadPath)?;
        let mut volume = self.mgr.open_volume(VolumeIdx(0))?;
        let mut root = volume.open_root_dir()?;
        let mut dir = if folder.is_empty() {
            root
        } else {
            root.open_dir(folder)?
        };
        dir.delete_file_in_dir(base)?;
        Ok(())
    }

    fn total_bytes(&mut self) -> u64 {
        self.capacity_bytes
    }

    fn used_bytes(&mut self) -> u64 {
        CONTENT_FOLDERS
            .iter()
            .map(|folder| self.folder_size(folder))
            .sum()
    }
}
