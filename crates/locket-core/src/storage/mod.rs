//! Storage abstraction consumed by the modes.
//!
//! Two volumes exist on the device: the removable SD card and the internal
//! flash filesystem. Modes only see these traits; board glue supplies the
//! real filesystems and [`mem::MemVolume`] backs tests and bring-up.

pub mod mem;

use heapless::{String, Vec};

/// Maximum directory entry name length in bytes.
pub const ENTRY_NAME_BYTES: usize = 64;
/// Maximum full path length in bytes.
pub const PATH_BYTES: usize = 80;
/// Maximum entries returned from one directory listing.
pub const MAX_DIR_ENTRIES: usize = 32;

/// Directory entry classification.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryKind {
    /// Poem document (`.md`).
    Document,
    /// Slideshow photo (`.bmp`).
    Photo,
    Directory,
    Other,
}

/// Classifies a file name by its extension, case-insensitively.
pub fn classify_name(name: &str) -> EntryKind {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return EntryKind::Other;
    };

    if ext.eq_ignore_ascii_case("md") {
        EntryKind::Document
    } else if ext.eq_ignore_ascii_case("bmp") {
        EntryKind::Photo
    } else {
        EntryKind::Other
    }
}

/// One directory listing entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DirEntry {
    /// Base name, without the folder prefix.
    pub name: String<ENTRY_NAME_BYTES>,
    pub kind: EntryKind,
    pub size: u32,
}

pub type DirListing = Vec<DirEntry, MAX_DIR_ENTRIES>;

/// Read-only volume operations.
pub trait Volume {
    type Error: core::fmt::Debug;

    /// Whether the backing medium mounted successfully.
    fn is_ready(&self) -> bool;

    /// Lists a folder. Entries beyond [`MAX_DIR_ENTRIES`] are dropped.
    fn list_dir(&mut self, folder: &str) -> Result<DirListing, Self::Error>;

    /// Metadata for a single path, `None` when absent.
    fn stat(&mut self, path: &str) -> Result<Option<DirEntry>, Self::Error>;

    fn exists(&mut self, path: &str) -> Result<bool, Self::Error> {
        Ok(self.stat(path)?.is_some())
    }

    /// Reads up to `buf.len()` bytes starting at `offset`; returns the count
    /// actually read (short at end of file).
    fn read(&mut self, path: &str, offset: u32, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Writable volume operations (internal flash only).
pub trait VolumeMut: Volume {
    /// Creates a directory; succeeds if it already exists.
    fn make_dir(&mut self, path: &str) -> Result<(), Self::Error>;

    /// Creates or truncates a file with the given contents.
    fn write(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Appends to an existing file (creating it when absent).
    fn append(&mut self, path: &str, data: &[u8]) -> Result<(), Self::Error>;

    fn remove(&mut self, path: &str) -> Result<(), Self::Error>;

    fn total_bytes(&mut self) -> u64;
    fn used_bytes(&mut self) -> u64;

    fn free_bytes(&mut self) -> u64 {
        self.total_bytes().saturating_sub(self.used_bytes())
    }
}

/// Joins a folder and a base name into a bounded path.
///
/// Returns `None` when the result would not fit [`PATH_BYTES`].
pub fn join_path(folder: &str, name: &str) -> Option<String<PATH_BYTES>> {
    let mut path = String::new();
    path.push_str(folder).ok()?;
    if !folder.ends_with('/') {
        path.push('/').ok()?;
    }
    path.push_str(name).ok()?;
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_name("autumn.md"), EntryKind::Document);
        assert_eq!(classify_name("AUTUMN.MD"), EntryKind::Document);
        assert_eq!(classify_name("cake.bmp"), EntryKind::Photo);
        assert_eq!(classify_name("cake.BMP"), EntryKind::Photo);
        assert_eq!(classify_name("notes.txt"), EntryKind::Other);
        assert_eq!(classify_name("README"), EntryKind::Other);
    }

    #[test]
    fn join_path_inserts_a_single_separator() {
        assert_eq!(join_path("/poems", "a.md").unwrap().as_str(), "/poems/a.md");
        assert_eq!(join_path("/poems/", "a.md").unwrap().as_str(), "/poems/a.md");
    }

    #[test]
    fn join_path_rejects_overlong_results() {
        let long = "x".repeat(PATH_BYTES);
        assert!(join_path("/poems", &long).is_none());
    }
}
