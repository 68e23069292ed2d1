//! In-memory volume used by tests and desktop bring-up.

use heapless::{String, Vec};

use super::{
    DirEntry, DirListing, EntryKind, MAX_DIR_ENTRIES, PATH_BYTES, Volume, VolumeMut, classify_name,
};

/// Capacity of one in-memory file.
pub const MEM_FILE_BYTES: usize = 4096;
/// Maximum number of in-memory files.
pub const MAX_MEM_FILES: usize = 24;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemVolumeError {
    NotReady,
    NotFound,
    NoSpace,
    TooManyFiles,
    PathTooLong,
}

struct MemFile {
    path: String<PATH_BYTES>,
    data: Vec<u8, MEM_FILE_BYTES>,
}

/// RAM-backed [`Volume`]/[`VolumeMut`] with a configurable capacity so the
/// disk-full paths can be exercised.
pub struct MemVolume {
    files: Vec<MemFile, MAX_MEM_FILES>,
    dirs: Vec<String<PATH_BYTES>, 8>,
    capacity: u64,
    ready: bool,
}

impl MemVolume {
    pub fn new() -> Self {
        Self::with_capacity(1024 * 1024)
    }

    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            files: Vec::new(),
            dirs: Vec::new(),
            capacity,
            ready: true,
        }
    }

    /// Marks the medium absent; every operation fails until re-enabled.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Seeds a file, replacing any previous content at the same path.
    pub fn insert(&mut self, path: &str, data: &[u8]) {
        let _ = self.remove_file(path);
        let mut file = MemFile {
            path: String::new(),
            data: Vec::new(),
        };
        file.path.push_str(path).expect("path fits");
        file.data.extend_from_slice(data).expect("data fits");
        self.files.push(file).ok().expect("file slot available");
    }

    pub fn contents(&self, path: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|f| f.path.as_str() == path)
            .map(|f| f.data.as_slice())
    }

    fn remove_file(&mut self, path: &str) -> bool {
        let Some(index) = self.files.iter().position(|f| f.path.as_str() == path) else {
            return false;
        };
        self.files.swap_remove(index);
        true
    }

    fn entry_for(file: &MemFile) -> DirEntry {
        let base = file.path.rsplit_once('/').map_or(file.path.as_str(), |(_, b)| b);
        let mut name = String::new();
        let _ = name.push_str(base);
        DirEntry {
            name,
            kind: classify_name(base),
            size: file.data.len() as u32,
        }
    }
}

impl Default for MemVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl Volume for MemVolume {
    type Error = MemVolumeError;

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn list_dir(&mut self, folder: &str) -> Result<DirListing, Self::Error> {
        if !self.ready {
            return Err(MemVolumeError::NotReady);
        }

        let folder = folder.trim_end_matches('/');
        let mut listing = DirListing::new();
        for file in &self.files {
            let Some(rest) = file.path.strip_prefix(folder) else {
                continue;
            };
            let Some(base) = rest.strip_prefix('/') else {
                continue;
            };
            if base.is_empty() || base.contains('/') {
                continue;
            }
            if listing.len() == MAX_DIR_ENTRIES {
                break;
            }
            let _ = listing.push(Self::entry_for(file));
        }
        Ok(listing)
    }

    fn stat(&mut self, path: &str) -> Result<Option<DirEntry>, Self::Error> {
        if !self.ready {
            return Err(MemVolumeError::NotReady);
        }

        if self.dirs.iter().any(|d| d.as_str() == path) {
            let mut name = String::new();
            let base = path.rsplit_once('/').map_or(path, |(_, b)| b);
            let _ = name.push_str(base);
            return Ok(Some(DirEntry {
                name,
                kind: EntryKind::Directory,
                size: 0,
            }));
        }

        Ok(self
            .files
            .iter()
            .find(|f| f.path.as_str() == path)
            .map(Self::entry_for))
    }

    fn read(&mut self, path: &str, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !self.ready {
            return Err(MemVolumeError::NotReady);
        }

        let file = self
            .files
            .iter()
            .find(|f| f.path.as_str() == path)
            .ok_or(MemVolumeError::NotFound)?;

        let start = (offset as usize).min(file.data.len());
        let count = buf.len().min(file.data.len() - start);
        buf[..count].copy_from_slice(&file.data[start..start + count]);
        Ok(count)
    }
}

impl VolumeMut for MemVolume {
    fn make_dir(&mut self, path: &str) -> Result<(), Self::Error> {
        if !self.ready {
            return Err(MemVolumeError::NotReady);
        }
        if self.dirs.iter().any(|d| d.as_str() == path) {
            return Ok(());
        }
        let mut dir = String::new();
        dir.push_str(path).map_err(|_| MemVolumeError::PathTooLong)?;
        self.dirs.push(dir).map_err(|_| MemVolumeError::TooManyFiles)
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error> {
        if !self.ready {
            return Err(MemVolumeError::NotReady);
        }

        let existing = self
            .files
            .iter()
            .find(|f| f.path.as_str() == path)
            .map_or(0, |f| f.data.len() as u64);
        if self.used_bytes() - existing + data.len() as u64 > self.capacity
            || data.len() > MEM_FILE_BYTES
        {
            return Err(MemVolumeError::NoSpace);
        }

        self.remove_file(path);
        let mut file = MemFile {
            path: String::new(),
            data: Vec::new(),
        };
        file.path.push_str(path).map_err(|_| MemVolumeError::PathTooLong)?;
        let _ = file.data.extend_from_slice(data);
        self.files.push(file).map_err(|_| MemVolumeError::TooManyFiles)
    }

    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error> {
        if !self.ready {
            return Err(MemVolumeError::NotReady);
        }
        if self.used_bytes() + data.len() as u64 > self.capacity {
            return Err(MemVolumeError::NoSpace);
        }

        match self.files.iter_mut().find(|f| f.path.as_str() == path) {
            Some(file) => file
                .data
                .extend_from_slice(data)
                .map_err(|_| MemVolumeError::NoSpace),
            None => self.write(path, data),
        }
    }

    fn remove(&mut self, path: &str) -> Result<(), Self::Error> {
        if !self.ready {
            return Err(MemVolumeError::NotReady);
        }
        if self.remove_file(path) {
            Ok(())
        } else {
            Err(MemVolumeError::NotFound)
        }
    }

    fn total_bytes(&mut self) -> u64 {
        self.capacity
    }

    fn used_bytes(&mut self) -> u64 {
        self.files.iter().map(|f| f.data.len() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_returns_direct_children_only() {
        let mut vol = MemVolume::new();
        vol.insert("/poems/a.md", b"a");
        vol.insert("/poems/b.bmp", b"bb");
        vol.insert("/poems/deep/c.md", b"c");
        vol.insert("/other/d.md", b"d");

        let listing = vol.list_dir("/poems").unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name.as_str(), "a.md");
        assert_eq!(listing[0].kind, EntryKind::Document);
        assert_eq!(listing[1].name.as_str(), "b.bmp");
        assert_eq!(listing[1].kind, EntryKind::Photo);
        assert_eq!(listing[1].size, 2);
    }

    #[test]
    fn chunked_reads_honor_offset_and_length() {
        let mut vol = MemVolume::new();
        vol.insert("/f.md", b"hello world");

        let mut buf = [0u8; 5];
        assert_eq!(vol.read("/f.md", 0, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(vol.read("/f.md", 6, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"world");
        assert_eq!(vol.read("/f.md", 11, &mut buf).unwrap(), 0);
    }

    #[test]
    fn capacity_limit_fails_writes_and_appends() {
        let mut vol = MemVolume::with_capacity(8);
        vol.write("/a", b"1234").unwrap();
        assert_eq!(vol.write("/b", b"123456789"), Err(MemVolumeError::NoSpace));
        assert_eq!(vol.append("/a", b"56789"), Err(MemVolumeError::NoSpace));
        vol.append("/a", b"5678").unwrap();
        assert_eq!(vol.contents("/a").unwrap(), b"12345678");
    }

    #[test]
    fn not_ready_medium_rejects_all_operations() {
        let mut vol = MemVolume::new();
        vol.insert("/f.md", b"x");
        vol.set_ready(false);

        assert!(!vol.is_ready());
        assert_eq!(vol.list_dir("/"), Err(MemVolumeError::NotReady));
        let mut buf = [0u8; 1];
        assert_eq!(vol.read("/f.md", 0, &mut buf), Err(MemVolumeError::NotReady));
    }
}
