//! Codec abstraction shared by the three compression algorithms.
//!
//! Every codec turns text into a self-contained byte blob and back:
//! - Huffman coding (frequency table + packed prefix codes)
//! - LZ77 (literal and back-reference tokens)
//! - LZ78 (dictionary index + character pairs)
//!
//! Text is handled as UTF-16 code units, so each "character" is a 16-bit
//! unit. Codecs hold no state; every call is independent.
//!
//! # Examples
//!
//! ```rust
//! use mizip::{Algorithm, Codec};
//!
//! let codec: Algorithm = "lz78".parse().unwrap();
//! let packed = codec.compress("TOBEORNOTTOBEORTOBEORNOT").unwrap();
//! assert_eq!(codec.decompress(&packed).unwrap(), "TOBEORNOTTOBEORTOBEORNOT");
//! assert_eq!(codec.id(), 3);
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub mod huffman;
pub mod lz77;
pub mod lz78;

use huffman::HuffmanCodec;
use lz77::Lz77Codec;
use lz78::Lz78Codec;

/// Trait for text compression algorithms
pub trait Codec {
    /// Compress the input text. Empty text compresses to an empty blob.
    fn compress(&self, text: &str) -> Result<Vec<u8>>;

    /// Decompress a blob produced by `compress`. An empty blob decodes to
    /// empty text.
    fn decompress(&self, data: &[u8]) -> Result<String>;

    /// Stable display name, also used to derive the archive algorithm id.
    fn name(&self) -> &'static str;
}

/// The closed set of codecs an archive can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Huffman,
    Lz77,
    Lz78,
}

impl Algorithm {
    /// All algorithms in id order.
    pub const ALL: [Algorithm; 3] = [Algorithm::Huffman, Algorithm::Lz77, Algorithm::Lz78];

    /// Archive identifier byte.
    pub fn id(self) -> u8 {
        match self {
            Algorithm::Huffman => 1,
            Algorithm::Lz77 => 2,
            Algorithm::Lz78 => 3,
        }
    }

    /// Resolve an archive identifier byte.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Algorithm::Huffman),
            2 => Ok(Algorithm::Lz77),
            3 => Ok(Algorithm::Lz78),
            other => Err(Error::UnknownAlgorithm(other)),
        }
    }

    /// Display name of the codec.
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Huffman => HuffmanCodec.name(),
            Algorithm::Lz77 => Lz77Codec.name(),
            Algorithm::Lz78 => Lz78Codec.name(),
        }
    }

    /// Identifier for a codec display name, 0 when the name is not recognized.
    pub fn id_for_name(name: &str) -> u8 {
        Self::ALL
            .iter()
            .find(|alg| alg.name() == name)
            .map_or(0, |alg| alg.id())
    }

    fn codec(self) -> &'static dyn Codec {
        match self {
            Algorithm::Huffman => &HuffmanCodec,
            Algorithm::Lz77 => &Lz77Codec,
            Algorithm::Lz78 => &Lz78Codec,
        }
    }
}

impl Codec for Algorithm {
    fn compress(&self, text: &str) -> Result<Vec<u8>> {
        self.codec().compress(text)
    }

    fn decompress(&self, data: &[u8]) -> Result<String> {
        self.codec().decompress(data)
    }

    fn name(&self) -> &'static str {
        Algorithm::name(*self)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Algorithm::name(*self))
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Case-insensitive match on the display name.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(Error::UnknownAlgorithm(0))
    }
}

/// Split text into the 16-bit units the codecs operate on.
pub(crate) fn to_units(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

/// Reassemble decoded units into text.
pub(crate) fn from_units(units: &[u16]) -> Result<String> {
    String::from_utf16(units).map_err(|_| Error::corrupt("decoded units are not valid UTF-16"))
}

/// Units stored in a single byte by the LZ codecs.
pub(crate) fn byte_unit(unit: u16) -> Result<u8> {
    u8::try_from(unit).map_err(|_| Error::CapacityExceeded {
        what: "character unit",
        value: unit as usize,
        limit: u8::MAX as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip() {
        for alg in Algorithm::ALL {
            assert_eq!(Algorithm::from_id(alg.id()).unwrap(), alg);
        }
        assert!(matches!(
            Algorithm::from_id(0),
            Err(Error::UnknownAlgorithm(0))
        ));
        assert!(matches!(
            Algorithm::from_id(9),
            Err(Error::UnknownAlgorithm(9))
        ));
    }

    #[test]
    fn test_id_for_name() {
        assert_eq!(Algorithm::id_for_name("Huffman"), 1);
        assert_eq!(Algorithm::id_for_name("LZ77"), 2);
        assert_eq!(Algorithm::id_for_name("LZ78"), 3);
        assert_eq!(Algorithm::id_for_name("Deflate"), 0);
    }

    #[test]
    fn test_parse_name() {
        assert_eq!("huffman".parse::<Algorithm>().unwrap(), Algorithm::Huffman);
        assert_eq!(" Lz77 ".parse::<Algorithm>().unwrap(), Algorithm::Lz77);
        assert!(matches!(
            "zip".parse::<Algorithm>(),
            Err(Error::UnknownAlgorithm(0))
        ));
    }

    #[test]
    fn test_dispatch_matches_codecs() {
        let text = "abracadabra abracadabra";
        assert_eq!(
            Algorithm::Huffman.compress(text).unwrap(),
            HuffmanCodec.compress(text).unwrap()
        );
        assert_eq!(
            Algorithm::Lz77.compress(text).unwrap(),
            Lz77Codec.compress(text).unwrap()
        );
        assert_eq!(
            Algorithm::Lz78.compress(text).unwrap(),
            Lz78Codec.compress(text).unwrap()
        );
    }

    #[test]
    fn test_empty_input() {
        for alg in Algorithm::ALL {
            assert!(alg.compress("").unwrap().is_empty());
            assert_eq!(alg.decompress(&[]).unwrap(), "");
        }
    }

    #[test]
    fn test_byte_unit_limit() {
        assert_eq!(byte_unit(255).unwrap(), 255);
        assert!(matches!(
            byte_unit(256),
            Err(Error::CapacityExceeded { value: 256, .. })
        ));
    }
}
