//! Copy-on-write byte buffers.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::trace;

use super::ShareFlags;
use crate::error::ValueError;

/// Smallest allocation made for a non-empty buffer.
const MIN_CAPACITY: usize = 32;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Capacity for a buffer that must hold `len` bytes.
#[inline]
fn expand(len: usize) -> usize {
    len.max(MIN_CAPACITY).next_power_of_two()
}

/// A growable byte buffer, embedded in Recon text as `%` base-64.
pub struct Data {
    store: Arc<Vec<u8>>,
    flags: ShareFlags,
}

impl Data {
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::new();
        }
        Self::from_vec(Vec::with_capacity(expand(capacity)))
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { store: Arc::new(bytes), flags: ShareFlags::default() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.store
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.store.to_vec()
    }

    pub fn branch(&self) -> Data {
        self.flags.alias();
        Data { store: Arc::clone(&self.store), flags: ShareFlags::aliased() }
    }

    pub fn commit(&mut self) -> &mut Self {
        self.flags.freeze();
        self
    }

    pub fn is_aliased(&self) -> bool {
        self.flags.is_aliased()
    }

    pub fn is_mutable(&self) -> bool {
        !self.flags.is_immutable()
    }

    pub fn get_byte(&self, index: usize) -> Result<u8, ValueError> {
        self.store
            .get(index)
            .copied()
            .ok_or(ValueError::IndexOutOfRange { index, len: self.len() })
    }

    pub fn set_byte(&mut self, index: usize, byte: u8) -> Result<(), ValueError> {
        let len = self.len();
        if index >= len {
            return Err(ValueError::IndexOutOfRange { index, len });
        }
        self.buf_mut(0)?[index] = byte;
        Ok(())
    }

    pub fn add_byte(&mut self, byte: u8) -> Result<(), ValueError> {
        self.buf_mut(1)?.push(byte);
        Ok(())
    }

    pub fn add_slice(&mut self, bytes: &[u8]) -> Result<(), ValueError> {
        self.buf_mut(bytes.len())?.extend_from_slice(bytes);
        Ok(())
    }

    pub fn add_data(&mut self, data: &Data) -> Result<(), ValueError> {
        self.add_slice(data.as_bytes())
    }

    pub fn clear(&mut self) -> Result<(), ValueError> {
        self.buf_mut(0)?.clear();
        Ok(())
    }

    /// Private storage with room for `additional` more bytes.
    fn buf_mut(&mut self, additional: usize) -> Result<&mut Vec<u8>, ValueError> {
        self.flags.begin_mutation()?;
        let needed = self.store.len() + additional;
        if Arc::get_mut(&mut self.store).is_none() {
            trace!(len = self.store.len(), "data detached from shared storage");
            let mut bytes = Vec::with_capacity(expand(needed));
            bytes.extend_from_slice(&self.store);
            self.store = Arc::new(bytes);
        }
        let buf = Arc::make_mut(&mut self.store);
        if needed > buf.capacity() {
            let target = expand(needed);
            trace!(from = buf.capacity(), to = target, "data buffer grow");
            buf.reserve_exact(target - buf.len());
        }
        Ok(buf)
    }

    // --- encodings ---

    /// Uppercase base-16.
    pub fn to_base16(&self) -> String {
        let mut out = String::with_capacity(self.len() * 2);
        for &byte in self.store.iter() {
            out.push(HEX_DIGITS[(byte >> 4) as usize] as char);
            out.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
        }
        out
    }

    /// Decode base-16 digits of either case.
    pub fn from_base16(text: &str) -> Result<Data, ValueError> {
        let digits = text.as_bytes();
        if digits.len() % 2 != 0 {
            return Err(ValueError::InvalidBase16 { position: digits.len() });
        }
        let mut bytes = Vec::with_capacity(expand(digits.len() / 2));
        for (pair, chunk) in digits.chunks_exact(2).enumerate() {
            let hi = hex_value(chunk[0]).ok_or(ValueError::InvalidBase16 { position: pair * 2 })?;
            let lo = hex_value(chunk[1]).ok_or(ValueError::InvalidBase16 { position: pair * 2 + 1 })?;
            bytes.push(hi << 4 | lo);
        }
        Ok(Data::from_vec(bytes))
    }

    /// Standard, padded base-64.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.as_bytes())
    }

    pub fn from_base64(text: &str) -> Result<Data, ValueError> {
        Ok(Data::from_vec(STANDARD.decode(text)?))
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}

impl Default for Data {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Data {
    fn clone(&self) -> Self {
        self.branch()
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Data {}

impl PartialOrd for Data {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic over the bytes; a proper prefix orders first.
impl Ord for Data {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for Data {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data(%{})", self.to_base64())
    }
}

impl From<Vec<u8>> for Data {
    fn from(bytes: Vec<u8>) -> Self {
        Data::from_vec(bytes)
    }
}

impl From<&[u8]> for Data {
    fn from(bytes: &[u8]) -> Self {
        Data::from_vec(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_is_power_of_two() {
        let mut data = Data::new();
        let mut reallocations = 0;
        let mut capacity = data.capacity();
        for i in 0..100u8 {
            data.add_byte(i).unwrap();
            if data.capacity() != capacity {
                reallocations += 1;
                capacity = data.capacity();
            }
        }
        assert_eq!(data.len(), 100);
        assert_eq!(data.to_vec(), (0..100u8).collect::<Vec<_>>());
        assert!(data.capacity() >= 32);
        assert!(data.capacity().is_power_of_two());
        assert!(reallocations <= 3, "{} reallocations", reallocations);
    }

    #[test]
    fn test_byte_access() {
        let mut data = Data::from(vec![1, 2, 3]);
        assert_eq!(data.get_byte(1), Ok(2));
        data.set_byte(1, 9).unwrap();
        assert_eq!(data.as_bytes(), &[1, 9, 3]);
        assert_eq!(data.get_byte(3), Err(ValueError::IndexOutOfRange { index: 3, len: 3 }));
        assert_eq!(data.set_byte(5, 0), Err(ValueError::IndexOutOfRange { index: 5, len: 3 }));
    }

    #[test]
    fn test_branch_copies_on_write() {
        let a = Data::from(vec![1, 2]);
        let mut b = a.branch();
        assert!(a.is_aliased());
        b.add_byte(3).unwrap();
        assert!(!b.is_aliased());
        assert!(a.is_aliased());
        assert_eq!(a.as_bytes(), &[1, 2]);
        assert_eq!(b.as_bytes(), &[1, 2, 3]);
        assert!(b.capacity().is_power_of_two());
    }

    #[test]
    fn test_commit_freezes() {
        let mut data = Data::from(vec![7]);
        data.commit();
        assert_eq!(data.add_byte(1), Err(ValueError::Immutable));
        assert_eq!(data.clear(), Err(ValueError::Immutable));
        assert_eq!(data.as_bytes(), &[7]);
    }

    #[test]
    fn test_ordering() {
        let short = Data::from(vec![1, 2]);
        let long = Data::from(vec![1, 2, 0]);
        let big = Data::from(vec![2]);
        assert!(short < long);
        assert!(long < big);
        assert_eq!(short, Data::from(&[1u8, 2][..]));
    }

    #[test]
    fn test_base16() {
        let data = Data::from(vec![0x00, 0xAB, 0x7f]);
        assert_eq!(data.to_base16(), "00AB7F");
        assert_eq!(Data::from_base16("00ab7F").unwrap(), data);
        assert_eq!(Data::from_base16("0G"), Err(ValueError::InvalidBase16 { position: 1 }));
        assert_eq!(Data::from_base16("abc"), Err(ValueError::InvalidBase16 { position: 3 }));
    }

    #[test]
    fn test_base64() {
        let data = Data::from(b"recon".to_vec());
        assert_eq!(data.to_base64(), "cmVjb24=");
        assert_eq!(Data::from_base64("cmVjb24=").unwrap(), data);
        assert!(matches!(Data::from_base64("cmV$"), Err(ValueError::InvalidBase64(_))));
    }
}
