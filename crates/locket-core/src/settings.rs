//! Persisted key-value settings abstraction.
//!
//! Each mode keeps its resume state (current photo, current poem, active
//! mode) as a namespaced integer. Stores are expected to survive power
//! loss; a missing key is not an error.

use heapless::{String, Vec};

/// Maximum namespace length in bytes.
pub const NAMESPACE_BYTES: usize = 16;
/// Maximum key length in bytes.
pub const KEY_BYTES: usize = 16;

/// Abstract namespaced integer store.
pub trait KvStore {
    type Error: core::fmt::Debug;

    /// Reads a value, `None` when the key was never written.
    fn get_i32(&mut self, namespace: &str, key: &str) -> Result<Option<i32>, Self::Error>;

    fn put_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<(), Self::Error>;
}

/// RAM-backed store for tests and bring-up; survives nothing.
pub struct MemKv {
    entries: Vec<(String<NAMESPACE_BYTES>, String<KEY_BYTES>, i32), 16>,
}

impl MemKv {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl Default for MemKv {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemKvError {
    Full,
    KeyTooLong,
}

impl KvStore for MemKv {
    type Error = MemKvError;

    fn get_i32(&mut self, namespace: &str, key: &str) -> Result<Option<i32>, Self::Error> {
        Ok(self
            .entries
            .iter()
            .find(|(ns, k, _)| ns.as_str() == namespace && k.as_str() == key)
            .map(|(_, _, v)| *v))
    }

    fn put_i32(&mut self, namespace: &str, key: &str, value: i32) -> Result<(), Self::Error> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(ns, k, _)| ns.as_str() == namespace && k.as_str() == key)
        {
            entry.2 = value;
            return Ok(());
        }

        let mut ns = String::new();
        ns.push_str(namespace).map_err(|_| MemKvError::KeyTooLong)?;
        let mut k = String::new();
        k.push_str(key).map_err(|_| MemKvError::KeyTooLong)?;
        self.entries
            .push((ns, k, value))
            .map_err(|_| MemKvError::Full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_read_as_none() {
        let mut kv = MemKv::new();
        assert_eq!(kv.get_i32("poems", "idx"), Ok(None));
    }

    #[test]
    fn namespaces_are_independent() {
        let mut kv = MemKv::new();
        kv.put_i32("poems", "idx", 3).unwrap();
        kv.put_i32("birthday", "idx", 7).unwrap();
        kv.put_i32("poems", "idx", 4).unwrap();

        assert_eq!(kv.get_i32("poems", "idx"), Ok(Some(4)));
        assert_eq!(kv.get_i32("birthday", "idx"), Ok(Some(7)));
    }
}
