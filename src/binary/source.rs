//! Byte access over a BIN file, either fully buffered or read on demand.

use parking_lot::Mutex;
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::Result;

/// Storage backend for one loaded database.
///
/// All accessors return `None` on a short read so a truncated file reads as
/// "row not found" rather than an error.
pub enum Storage {
    /// Whole file held in memory
    Buffer(Vec<u8>),
    /// Open handle; every access seeks and reads
    File(Mutex<File>),
}

impl Storage {
    /// Open a database file.
    ///
    /// With `cache_in_memory` the file is read completely and the handle is
    /// closed right away.
    pub fn open(path: &Path, cache_in_memory: bool) -> Result<Self> {
        if cache_in_memory {
            Ok(Storage::Buffer(std::fs::read(path)?))
        } else {
            Ok(Storage::File(Mutex::new(File::open(path)?)))
        }
    }

    /// Whether the file is held in memory.
    pub fn is_buffered(&self) -> bool {
        matches!(self, Storage::Buffer(_))
    }

    /// Total size of the underlying file.
    pub fn byte_len(&self) -> io::Result<u64> {
        match self {
            Storage::Buffer(bytes) => Ok(bytes.len() as u64),
            Storage::File(file) => Ok(file.lock().metadata()?.len()),
        }
    }

    /// Read `len` bytes at a 0-based offset.
    pub fn read_at(&self, offset: u64, len: usize) -> Option<Cow<'_, [u8]>> {
        match self {
            Storage::Buffer(bytes) => {
                let start = usize::try_from(offset).ok()?;
                let end = start.checked_add(len)?;
                bytes.get(start..end).map(Cow::Borrowed)
            }
            Storage::File(file) => {
                let mut buf = vec![0u8; len];
                let mut file = file.lock();
                let result = file
                    .seek(SeekFrom::Start(offset))
                    .and_then(|_| file.read_exact(&mut buf));
                match result {
                    Ok(()) => Some(Cow::Owned(buf)),
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => None,
                    Err(e) => {
                        log::debug!("read of {} bytes at {} failed: {}", len, offset, e);
                        None
                    }
                }
            }
        }
    }

    /// Read bytes at a 1-based file position.
    pub fn read_bytes(&self, pos: u64, len: usize) -> Option<Cow<'_, [u8]>> {
        self.read_at(pos.checked_sub(1)?, len)
    }

    /// Read one byte at a 1-based position.
    pub fn read_u8(&self, pos: u64) -> Option<u8> {
        self.read_bytes(pos, 1).map(|b| b[0])
    }

    /// Read a little-endian u32 at a 1-based position.
    pub fn read_u32(&self, pos: u64) -> Option<u32> {
        let b = self.read_bytes(pos, 4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a little-endian u128 at a 1-based position.
    pub fn read_u128(&self, pos: u64) -> Option<u128> {
        let b = self.read_bytes(pos, 16)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&b);
        Some(u128::from_le_bytes(raw))
    }

    /// Read a length-prefixed string.
    ///
    /// `pointer` is the value stored in a row column: the 0-based offset of
    /// the length byte. A lone `-` means "not available" and reads as empty.
    pub fn read_string(&self, pointer: u32) -> Option<String> {
        let offset = pointer as u64;
        let len = self.read_at(offset, 1)?[0] as usize;
        if len == 0 {
            return Some(String::new());
        }
        let bytes = self.read_at(offset + 1, len)?;
        let value = String::from_utf8_lossy(&bytes);
        if value == "-" {
            Some(String::new())
        } else {
            Some(value.into_owned())
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Storage::Buffer(bytes) => write!(f, "Storage::Buffer({} bytes)", bytes.len()),
            Storage::File(_) => write!(f, "Storage::File"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> Vec<u8> {
        let mut bytes = vec![0xAB];
        bytes.extend_from_slice(&0x0102_0304u32.to_le_bytes());
        bytes.extend_from_slice(&42u128.to_le_bytes());
        // string "US" at offset 21, "-" at offset 24
        bytes.extend_from_slice(&[2, b'U', b'S', 1, b'-']);
        bytes
    }

    fn both_backends(bytes: &[u8]) -> (Storage, Storage, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        let buffered = Storage::open(file.path(), true).unwrap();
        let handle = Storage::open(file.path(), false).unwrap();
        (buffered, handle, file)
    }

    #[test]
    fn test_accessors_agree_across_backends() {
        let (buffered, handle, _file) = both_backends(&sample());
        assert!(buffered.is_buffered());
        assert!(!handle.is_buffered());

        for storage in [&buffered, &handle] {
            assert_eq!(storage.read_u8(1), Some(0xAB));
            assert_eq!(storage.read_u32(2), Some(0x0102_0304));
            assert_eq!(storage.read_u128(6), Some(42));
            assert_eq!(storage.read_string(21).as_deref(), Some("US"));
            assert_eq!(storage.read_string(24).as_deref(), Some(""));
        }
    }

    #[test]
    fn test_short_reads_are_none() {
        let (buffered, handle, _file) = both_backends(&sample());
        let len = sample().len() as u64;

        for storage in [&buffered, &handle] {
            assert_eq!(storage.read_u8(len), Some(b'-'));
            assert_eq!(storage.read_u8(len + 1), None);
            assert_eq!(storage.read_u32(len - 2), None);
            assert_eq!(storage.read_u128(len - 10), None);
            assert_eq!(storage.read_u8(0), None);
        }
    }

    #[test]
    fn test_zero_is_not_a_short_read() {
        let (buffered, handle, _file) = both_backends(&[0, 0, 0, 0]);
        for storage in [&buffered, &handle] {
            assert_eq!(storage.read_u32(1), Some(0));
            assert_eq!(storage.read_string(0).as_deref(), Some(""));
        }
    }
}
