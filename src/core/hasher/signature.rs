//! Bit signatures and Hamming distance.

use serde::{Deserialize, Serialize};

/// A fixed-length bit vector, one byte per bit (0 or 1)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashSignature {
    bits: Vec<u8>,
}

impl HashSignature {
    /// Wrap a vector of 0/1 bytes. Any non-zero byte counts as 1.
    pub fn from_bits(bits: Vec<u8>) -> Self {
        Self {
            bits: bits.into_iter().map(|b| u8::from(b != 0)).collect(),
        }
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the signature has no bits
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The raw bit bytes
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Count of differing bit positions.
    ///
    /// Signatures of different lengths are maximally dissimilar and
    /// return `u32::MAX`, which no threshold accepts.
    pub fn distance(&self, other: &HashSignature) -> u32 {
        if self.bits.len() != other.bits.len() {
            return u32::MAX;
        }
        self.bits
            .iter()
            .zip(other.bits.iter())
            .filter(|(a, b)| a != b)
            .count() as u32
    }

    /// Get the signature as a hexadecimal string, 4 bits per digit
    pub fn to_hex(&self) -> String {
        self.bits
            .chunks(4)
            .map(|nibble| {
                let value = nibble.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
                char::from_digit(value, 16).unwrap_or('0')
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(bits: &[u8]) -> HashSignature {
        HashSignature::from_bits(bits.to_vec())
    }

    #[test]
    fn distance_to_self_is_zero() {
        let hash = sig(&[1, 0, 1, 1, 0]);
        assert_eq!(hash.distance(&hash), 0);
    }

    #[test]
    fn distance_is_symmetric_and_bounded() {
        let a = sig(&[1, 1, 0, 0, 1, 0, 1, 0]);
        let b = sig(&[0, 1, 1, 0, 1, 1, 1, 1]);

        assert_eq!(a.distance(&b), b.distance(&a));
        assert!(a.distance(&b) <= a.len() as u32);
    }

    #[test]
    fn distance_counts_differing_bits() {
        assert_eq!(sig(&[1, 1, 1, 1]).distance(&sig(&[0, 0, 0, 0])), 4);
        assert_eq!(sig(&[1, 0, 1, 0]).distance(&sig(&[1, 1, 1, 0])), 1);
    }

    #[test]
    fn unequal_lengths_are_maximally_dissimilar() {
        let short = sig(&[1, 0]);
        let long = sig(&[1, 0, 0]);
        assert_eq!(short.distance(&long), u32::MAX);
        assert_eq!(long.distance(&short), u32::MAX);
    }

    #[test]
    fn from_bits_normalises_to_zero_one() {
        assert_eq!(sig(&[0, 5, 255]).bits(), &[0, 1, 1]);
    }

    #[test]
    fn to_hex_packs_nibbles() {
        assert_eq!(sig(&[1, 1, 1, 1, 0, 0, 0, 1]).to_hex(), "f1");
    }
}
