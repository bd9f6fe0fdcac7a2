//! Canonical byte encoding fed to the block digest.
//!
//! The layout is fixed and must stay bit-for-bit stable: mining, reconstruction
//! and verification all hash the same bytes, and stored hashes are compared
//! byte-for-byte.
//!
//! # Binary Format
//!
//! - Integers: big-endian, fixed-width
//! - `str`/`String`: raw UTF-8 bytes, no length prefix
//! - `Hash`: raw digest bytes, no length prefix
//!
//! # Example
//!
//! ```
//! use hashchain::types::encoding::Encode;
//!
//! let bytes = 258u32.to_vec();
//! assert_eq!(bytes, vec![0, 0, 1, 2]);
//! ```

/// Sink for writing encoded bytes.
///
/// Implemented by byte buffers and hashers so encodable values can be hashed
/// directly without building an intermediate buffer.
pub trait EncodeSink {
    /// Writes the given bytes to the sink.
    fn write(&mut self, bytes: &[u8]);
}

/// Counter for computing encoded size without allocating memory.
///
/// Used by `Encode::to_vec` to pre-allocate exact capacity before encoding.
pub struct SizeCounter {
    len: usize,
}

impl SizeCounter {
    /// Creates a new counter initialized to zero.
    pub fn new() -> Self {
        Self { len: 0 }
    }

    /// Returns the total number of bytes counted.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing has been counted yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SizeCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeSink for SizeCounter {
    fn write(&mut self, bytes: &[u8]) {
        self.len += bytes.len();
    }
}

impl EncodeSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Types with a canonical binary representation.
pub trait Encode {
    /// Writes the canonical representation to the given sink.
    fn encode<S: EncodeSink>(&self, out: &mut S);

    /// Serializes to a new buffer with exact capacity.
    ///
    /// Performs two passes: first to count bytes, then to encode.
    fn to_vec(&self) -> Vec<u8> {
        let mut counter = SizeCounter::new();
        self.encode(&mut counter);

        let mut out = Vec::with_capacity(counter.len());
        self.encode(&mut out);
        out
    }
}

macro_rules! impl_int {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode<S: EncodeSink>(&self, out: &mut S) {
                    out.write(&self.to_be_bytes());
                }
            }
        )*
    };
}

impl_int!(u32, i32, u64);

impl Encode for str {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(self.as_bytes());
    }
}

impl Encode for String {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.as_str().encode(out);
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        (**self).encode(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_big_endian() {
        assert_eq!(0x0102_0304u32.to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(
            0x0102_0304_0506_0708u64.to_vec(),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn negative_i32_uses_twos_complement() {
        assert_eq!((-1i32).to_vec(), vec![0xFF; 4]);
        assert_eq!((-2i32).to_vec(), vec![0xFF, 0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn strings_have_no_length_prefix() {
        assert_eq!("abc".to_vec(), b"abc".to_vec());
        assert!("".to_vec().is_empty());
        assert_eq!(String::from("é").to_vec(), "é".as_bytes().to_vec());
    }

    #[test]
    fn size_counter_matches_encoded_length() {
        let mut counter = SizeCounter::new();
        assert!(counter.is_empty());
        7u64.encode(&mut counter);
        "hello".encode(&mut counter);
        assert_eq!(counter.len(), 13);
    }

    #[test]
    fn reference_encodes_like_value() {
        let value = 42u32;
        assert_eq!((&value).to_vec(), value.to_vec());
    }
}
