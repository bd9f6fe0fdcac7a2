//! SHA-256 digest values and the incremental builder that produces them.

use crate::types::encoding::{Encode, EncodeSink};
use hashchain_derive::Error;
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 output length in bytes.
pub const HASH_LEN: usize = 32;

/// Errors raised when reading a [`Hash`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashError {
    #[error("byte index {index} is out of range for a hash of length {len}")]
    OutOfRange { index: usize, len: usize },
}

/// Immutable digest bytes.
///
/// Block hashes are always [`HASH_LEN`] bytes long, but the type itself
/// places no constraint on length: the genesis block links to the empty hash.
/// Equality and `std::hash::Hash` are both defined over the byte content, so
/// equal hashes always land in the same bucket of a keyed container.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Hash(Box<[u8]>);

impl Hash {
    /// Creates a hash by copying the given bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Hash {
        Hash(bytes.into().into_boxed_slice())
    }

    /// The zero-length hash used as the genesis block's predecessor.
    pub fn empty() -> Hash {
        Hash(Box::default())
    }

    /// Returns the number of bytes in the hash.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the zero-length hash.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the byte at `index`.
    pub fn byte_at(&self, index: usize) -> Result<u8, HashError> {
        self.0.get(index).copied().ok_or(HashError::OutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Returns the hash as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns an owned copy of the bytes; mutating it never affects the hash.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Uppercase hexadecimal, two characters per byte.
    pub fn to_hex_string(&self) -> String {
        self.to_string()
    }

    /// Counts the zero bytes at the start of the hash.
    pub fn leading_zero_bytes(&self) -> usize {
        self.0.iter().take_while(|&&b| b == 0).count()
    }

    /// Creates a new SHA-256 hash builder for incremental hashing.
    pub fn sha256() -> HashBuilder {
        HashBuilder::new()
    }

    /// Hashes the canonical encoding of `value`.
    pub fn digest<T: Encode + ?Sized>(value: &T) -> Hash {
        let mut h = Hash::sha256();
        value.encode(&mut h);
        h.finalize()
    }
}

impl From<Vec<u8>> for Hash {
    fn from(bytes: Vec<u8>) -> Self {
        Hash(bytes.into_boxed_slice())
    }
}

impl From<&[u8]> for Hash {
    fn from(bytes: &[u8]) -> Self {
        Hash(bytes.into())
    }
}

impl<const N: usize> From<[u8; N]> for Hash {
    fn from(bytes: [u8; N]) -> Self {
        Hash(Box::new(bytes))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

impl Encode for Hash {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&self.0);
    }
}

/// Incremental SHA-256 hash builder.
///
/// Cloning a builder forks the digest state; the miner hashes a block's fixed
/// prefix once and clones it for every candidate nonce.
#[derive(Clone, Default)]
pub struct HashBuilder {
    hasher: Sha256,
}

impl HashBuilder {
    /// Creates a new hash builder with empty state.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Feeds data into the hash computation.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Feeds data and returns the builder, for chained one-liners.
    pub fn chain(mut self, data: &[u8]) -> Self {
        self.update(data);
        self
    }

    /// Consumes the builder and returns the final hash.
    pub fn finalize(self) -> Hash {
        Hash::new(self.hasher.finalize().to_vec())
    }
}

impl EncodeSink for HashBuilder {
    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn sha256_of_empty_input() {
        let hash = Hash::sha256().finalize();
        assert_eq!(hash.len(), HASH_LEN);
        assert_eq!(
            hash.to_hex_string(),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn sha256_of_abc() {
        let hash = Hash::sha256().chain(b"abc").finalize();
        assert_eq!(
            hash.to_string(),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut h = Hash::sha256();
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(h.finalize(), Hash::sha256().chain(b"hello world").finalize());
    }

    #[test]
    fn cloned_builder_forks_state() {
        let prefix = Hash::sha256().chain(b"prefix");
        let a = prefix.clone().chain(b"a").finalize();
        let b = prefix.chain(b"b").finalize();
        assert_ne!(a, b);
        assert_eq!(a, Hash::sha256().chain(b"prefixa").finalize());
    }

    #[test]
    fn hex_is_uppercase_two_chars_per_byte() {
        let hash = Hash::from([0x00, 0x0A, 0xFF, 0x7B]);
        assert_eq!(hash.to_hex_string(), "000AFF7B");
        assert_eq!(Hash::empty().to_hex_string(), "");
    }

    #[test]
    fn byte_at_checks_bounds() {
        let hash = Hash::from([1, 2, 3]);
        assert_eq!(hash.byte_at(0), Ok(1));
        assert_eq!(hash.byte_at(2), Ok(3));
        assert_eq!(
            hash.byte_at(3),
            Err(HashError::OutOfRange { index: 3, len: 3 })
        );
        assert!(Hash::empty().byte_at(0).is_err());
    }

    #[test]
    fn out_of_range_message_names_index_and_length() {
        let err = Hash::from([9]).byte_at(5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "byte index 5 is out of range for a hash of length 1"
        );
    }

    #[test]
    fn to_bytes_returns_independent_copy() {
        let hash = Hash::from([1, 2, 3]);
        let mut bytes = hash.to_bytes();
        bytes[0] = 99;
        assert_eq!(hash.byte_at(0), Ok(1));
    }

    #[test]
    fn new_copies_input() {
        let mut source = vec![4, 5, 6];
        let hash = Hash::new(source.clone());
        source[0] = 0;
        assert_eq!(hash.as_slice(), &[4, 5, 6]);
    }

    #[test]
    fn equality_is_by_content() {
        assert_eq!(Hash::from(vec![1, 2]), Hash::from(&[1u8, 2][..]));
        assert_ne!(Hash::from([1, 2]), Hash::from([1, 2, 0]));
        assert_eq!(Hash::empty(), Hash::default());
    }

    #[test]
    fn equal_hashes_share_map_entries() {
        let mut seen = HashMap::new();
        seen.insert(Hash::from([7, 7]), "first");
        seen.insert(Hash::new(vec![7, 7]), "second");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[&Hash::from([7, 7])], "second");
    }

    #[test]
    fn leading_zero_bytes_counts_prefix() {
        assert_eq!(Hash::from([0, 0, 1, 0]).leading_zero_bytes(), 2);
        assert_eq!(Hash::from([1, 0]).leading_zero_bytes(), 0);
        assert_eq!(Hash::from([0, 0]).leading_zero_bytes(), 2);
        assert_eq!(Hash::empty().leading_zero_bytes(), 0);
    }

    #[test]
    fn digest_hashes_encoding() {
        assert_eq!(
            Hash::digest("abc"),
            Hash::sha256().chain(b"abc").finalize()
        );
    }

    #[test]
    fn encode_writes_raw_bytes() {
        assert_eq!(Hash::from([0xAB, 0xCD]).to_vec(), vec![0xAB, 0xCD]);
        assert!(Hash::empty().to_vec().is_empty());
    }
}
